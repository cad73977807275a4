// db/providerdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::providermodel::*;

#[async_trait]
pub trait ProviderExt {
    async fn get_prefs(&self, phone: &str) -> Result<Option<UserPrefs>, Error>;

    /// `session` is the conversation that performed the selection; the
    /// interpreter needs it to keep decoding that conversation's accumulated
    /// input consistently. Pass None when the change completes a flow.
    async fn set_role(
        &self,
        phone: &str,
        role: UserRole,
        session: Option<&str>,
    ) -> Result<(), Error>;

    async fn set_customer_village(&self, phone: &str, village: &str) -> Result<(), Error>;

    async fn set_customer_landmark(&self, phone: &str, landmark: &str) -> Result<(), Error>;

    async fn upsert_provider(
        &self,
        phone: &str,
        kind: ProviderKind,
        name: &str,
        village: &str,
        affiliation: &str,
    ) -> Result<Provider, Error>;

    async fn get_provider(&self, phone: &str) -> Result<Option<Provider>, Error>;

    async fn set_provider_landmark(&self, phone: &str, landmark: &str) -> Result<(), Error>;

    async fn list_services(&self, kind: Option<ProviderKind>) -> Result<Vec<Service>, Error>;

    async fn set_provider_service(
        &self,
        phone: &str,
        service_id: i32,
        active: bool,
    ) -> Result<(), Error>;

    async fn active_service_ids(&self, phone: &str) -> Result<Vec<i32>, Error>;

    /// Record a community landmark. Duplicate (village, name) pairs are
    /// silently kept as-is so replayed input cannot multiply rows.
    async fn add_landmark(
        &self,
        village: &str,
        name: &str,
        description: &str,
        added_by: &str,
    ) -> Result<(), Error>;

    async fn list_landmarks(&self, village: &str, limit: i64) -> Result<Vec<Landmark>, Error>;
}

#[async_trait]
impl ProviderExt for DBClient {
    async fn get_prefs(&self, phone: &str) -> Result<Option<UserPrefs>, Error> {
        sqlx::query_as::<_, UserPrefs>(
            r#"
            SELECT phone, role, role_session, village, landmark, created_at, updated_at
            FROM user_prefs
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_role(
        &self,
        phone: &str,
        role: UserRole,
        session: Option<&str>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_prefs (phone, role, role_session)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone) DO UPDATE SET
                role = EXCLUDED.role,
                role_session = EXCLUDED.role_session,
                updated_at = NOW()
            "#,
        )
        .bind(phone)
        .bind(role)
        .bind(session)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_customer_village(&self, phone: &str, village: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_prefs (phone, village)
            VALUES ($1, $2)
            ON CONFLICT (phone) DO UPDATE SET
                village = EXCLUDED.village,
                updated_at = NOW()
            "#,
        )
        .bind(phone)
        .bind(village)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_customer_landmark(&self, phone: &str, landmark: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_prefs (phone, landmark)
            VALUES ($1, $2)
            ON CONFLICT (phone) DO UPDATE SET
                landmark = EXCLUDED.landmark,
                updated_at = NOW()
            "#,
        )
        .bind(phone)
        .bind(landmark)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_provider(
        &self,
        phone: &str,
        kind: ProviderKind,
        name: &str,
        village: &str,
        affiliation: &str,
    ) -> Result<Provider, Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (phone, kind, name, village, affiliation)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE SET
                kind = EXCLUDED.kind,
                name = EXCLUDED.name,
                village = EXCLUDED.village,
                affiliation = EXCLUDED.affiliation,
                updated_at = NOW()
            RETURNING phone, kind, name, village, affiliation, current_landmark,
                      created_at, updated_at
            "#,
        )
        .bind(phone)
        .bind(kind)
        .bind(name)
        .bind(village)
        .bind(affiliation)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_provider(&self, phone: &str) -> Result<Option<Provider>, Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            SELECT phone, kind, name, village, affiliation, current_landmark,
                   created_at, updated_at
            FROM providers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_provider_landmark(&self, phone: &str, landmark: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE providers
            SET current_landmark = $2, updated_at = NOW()
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .bind(landmark)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_services(&self, kind: Option<ProviderKind>) -> Result<Vec<Service>, Error> {
        match kind {
            Some(kind) => {
                sqlx::query_as::<_, Service>(
                    r#"
                    SELECT id, name, kind
                    FROM services
                    WHERE kind = $1 OR kind = 'any'
                    ORDER BY id ASC
                    "#,
                )
                .bind(ServiceKind::from(kind))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Service>(
                    "SELECT id, name, kind FROM services ORDER BY id ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn set_provider_service(
        &self,
        phone: &str,
        service_id: i32,
        active: bool,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO provider_services (phone, service_id, active)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone, service_id) DO UPDATE SET active = EXCLUDED.active
            "#,
        )
        .bind(phone)
        .bind(service_id)
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_service_ids(&self, phone: &str) -> Result<Vec<i32>, Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT service_id FROM provider_services WHERE phone = $1 AND active",
        )
        .bind(phone)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_landmark(
        &self,
        village: &str,
        name: &str,
        description: &str,
        added_by: &str,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO landmarks (village, name, description, added_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (village, name) DO NOTHING
            "#,
        )
        .bind(village)
        .bind(name)
        .bind(description)
        .bind(added_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_landmarks(&self, village: &str, limit: i64) -> Result<Vec<Landmark>, Error> {
        sqlx::query_as::<_, Landmark>(
            r#"
            SELECT id, village, name, description, added_by, created_at
            FROM landmarks
            WHERE village = $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(village)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
