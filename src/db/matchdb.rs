// db/matchdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::matchmodel::*;

#[async_trait]
pub trait MatchExt {
    async fn create_request(
        &self,
        customer_phone: &str,
        service_id: i32,
        village: &str,
        landmark: &str,
        note: &str,
    ) -> Result<ServiceRequest, Error>;

    async fn get_request(&self, request_id: i64) -> Result<Option<ServiceRequest>, Error>;

    /// Providers advertising the request's service as active, in its village.
    /// Ordered by phone so downstream ranking stays deterministic.
    async fn candidate_providers(
        &self,
        service_id: i32,
        village: &str,
    ) -> Result<Vec<CandidateProvider>, Error>;

    /// Assignments won by a provider inside a trailing window, the fairness
    /// signal.
    async fn recent_assignment_count(
        &self,
        provider_phone: &str,
        window_hours: i32,
    ) -> Result<i64, Error>;

    /// Insert one offer; returns false when the (request, provider) pair
    /// already exists. Double-invoking build_offers must not duplicate rows.
    async fn insert_offer(
        &self,
        request_id: i64,
        provider_phone: &str,
        score: f64,
        eta_minutes: i32,
    ) -> Result<bool, Error>;

    async fn mark_request_offered(&self, request_id: i64) -> Result<(), Error>;

    async fn pending_offers(
        &self,
        provider_phone: &str,
        limit: i64,
    ) -> Result<Vec<PendingOffer>, Error>;

    /// The whole accept path in one transaction. The conditional insert on
    /// assignments(request_id UNIQUE) is the sole arbiter of exclusivity.
    async fn accept_offer_tx(
        &self,
        provider_phone: &str,
        offer_id: i64,
    ) -> Result<AcceptOutcome, Error>;

    async fn pass_offer(&self, provider_phone: &str, offer_id: i64) -> Result<bool, Error>;

    async fn active_jobs(&self, provider_phone: &str, limit: i64) -> Result<Vec<ActiveJob>, Error>;

    /// Close an accepted request, guarded by the (provider, request)
    /// assignment. Returns false when the guard fails; no state changes.
    async fn close_request(&self, provider_phone: &str, request_id: i64) -> Result<bool, Error>;

    async fn requests_by_customer(
        &self,
        customer_phone: &str,
        limit: i64,
    ) -> Result<Vec<RequestSummary>, Error>;

    async fn insert_anchor_receipt(
        &self,
        request_id: i64,
        acknowledged: bool,
    ) -> Result<(), Error>;
}

#[async_trait]
impl MatchExt for DBClient {
    async fn create_request(
        &self,
        customer_phone: &str,
        service_id: i32,
        village: &str,
        landmark: &str,
        note: &str,
    ) -> Result<ServiceRequest, Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (customer_phone, service_id, village, landmark, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_phone, service_id, village, landmark, note, status, created_at
            "#,
        )
        .bind(customer_phone)
        .bind(service_id)
        .bind(village)
        .bind(landmark)
        .bind(note)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_request(&self, request_id: i64) -> Result<Option<ServiceRequest>, Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, customer_phone, service_id, village, landmark, note, status, created_at
            FROM service_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn candidate_providers(
        &self,
        service_id: i32,
        village: &str,
    ) -> Result<Vec<CandidateProvider>, Error> {
        sqlx::query_as::<_, CandidateProvider>(
            r#"
            SELECT p.phone, p.current_landmark
            FROM providers p
            JOIN provider_services ps ON ps.phone = p.phone
            WHERE ps.service_id = $1
              AND ps.active
              AND p.village = $2
            ORDER BY p.phone ASC
            "#,
        )
        .bind(service_id)
        .bind(village)
        .fetch_all(&self.pool)
        .await
    }

    async fn recent_assignment_count(
        &self,
        provider_phone: &str,
        window_hours: i32,
    ) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM assignments
            WHERE provider_phone = $1
              AND assigned_at >= NOW() - ($2 * INTERVAL '1 hour')
            "#,
        )
        .bind(provider_phone)
        .bind(window_hours)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_offer(
        &self,
        request_id: i64,
        provider_phone: &str,
        score: f64,
        eta_minutes: i32,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO request_offers (request_id, provider_phone, score, eta_minutes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (request_id, provider_phone) DO NOTHING
            "#,
        )
        .bind(request_id)
        .bind(provider_phone)
        .bind(score)
        .bind(eta_minutes)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_request_offered(&self, request_id: i64) -> Result<(), Error> {
        // Forward-only: a request that already advanced is left alone.
        sqlx::query(
            "UPDATE service_requests SET status = 'offered' WHERE id = $1 AND status = 'new'",
        )
        .bind(request_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending_offers(
        &self,
        provider_phone: &str,
        limit: i64,
    ) -> Result<Vec<PendingOffer>, Error> {
        sqlx::query_as::<_, PendingOffer>(
            r#"
            SELECT ro.id AS offer_id, ro.request_id, ro.eta_minutes,
                   sr.village, sr.landmark, sr.note
            FROM request_offers ro
            JOIN service_requests sr ON sr.id = ro.request_id
            WHERE ro.provider_phone = $1 AND ro.status = 'offered'
            ORDER BY ro.id ASC
            LIMIT $2
            "#,
        )
        .bind(provider_phone)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn accept_offer_tx(
        &self,
        provider_phone: &str,
        offer_id: i64,
    ) -> Result<AcceptOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        let offer = sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, request_id, provider_phone, score, eta_minutes, status, created_at
            FROM request_offers
            WHERE id = $1 AND provider_phone = $2
            FOR UPDATE
            "#,
        )
        .bind(offer_id)
        .bind(provider_phone)
        .fetch_optional(&mut *tx)
        .await?;

        let offer = match offer {
            Some(offer) => offer,
            None => {
                tx.rollback().await?;
                return Ok(AcceptOutcome::NotAvailable);
            }
        };

        match offer.status {
            // A gateway retry of an already-won accept reports success again.
            OfferStatus::Accepted => {
                tx.rollback().await?;
                return Ok(AcceptOutcome::Accepted);
            }
            OfferStatus::Passed => {
                tx.rollback().await?;
                return Ok(AcceptOutcome::NotAvailable);
            }
            OfferStatus::Offered => {}
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO assignments (request_id, provider_phone)
            VALUES ($1, $2)
            ON CONFLICT (request_id) DO NOTHING
            "#,
        )
        .bind(offer.request_id)
        .bind(provider_phone)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            // A concurrent accept won the race; a rejected insert and a
            // pre-existing assignment are the same outcome.
            let holder = sqlx::query_as::<_, Assignment>(
                r#"
                SELECT id, request_id, provider_phone, assigned_at
                FROM assignments
                WHERE request_id = $1
                "#,
            )
            .bind(offer.request_id)
            .fetch_optional(&mut *tx)
            .await?;

            if holder.map(|a| a.provider_phone).as_deref() == Some(provider_phone) {
                tx.rollback().await?;
                return Ok(AcceptOutcome::Accepted);
            }

            sqlx::query("UPDATE request_offers SET status = 'passed' WHERE id = $1")
                .bind(offer_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(AcceptOutcome::NotAvailable);
        }

        sqlx::query("UPDATE request_offers SET status = 'accepted' WHERE id = $1")
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE service_requests SET status = 'accepted' WHERE id = $1 AND status <> 'closed'",
        )
        .bind(offer.request_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE request_offers
            SET status = 'passed'
            WHERE request_id = $1 AND id <> $2 AND status = 'offered'
            "#,
        )
        .bind(offer.request_id)
        .bind(offer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AcceptOutcome::Accepted)
    }

    async fn pass_offer(&self, provider_phone: &str, offer_id: i64) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE request_offers
            SET status = 'passed'
            WHERE id = $1 AND provider_phone = $2 AND status = 'offered'
            "#,
        )
        .bind(offer_id)
        .bind(provider_phone)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_jobs(&self, provider_phone: &str, limit: i64) -> Result<Vec<ActiveJob>, Error> {
        sqlx::query_as::<_, ActiveJob>(
            r#"
            SELECT sr.id AS request_id, s.name AS service_name, sr.landmark, sr.note
            FROM assignments a
            JOIN service_requests sr ON sr.id = a.request_id
            JOIN services s ON s.id = sr.service_id
            WHERE a.provider_phone = $1
              AND sr.status = 'accepted'
            ORDER BY sr.id ASC
            LIMIT $2
            "#,
        )
        .bind(provider_phone)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn close_request(&self, provider_phone: &str, request_id: i64) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE service_requests sr
            SET status = 'closed'
            WHERE sr.id = $2
              AND sr.status = 'accepted'
              AND EXISTS (
                  SELECT 1 FROM assignments a
                  WHERE a.request_id = sr.id AND a.provider_phone = $1
              )
            "#,
        )
        .bind(provider_phone)
        .bind(request_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn requests_by_customer(
        &self,
        customer_phone: &str,
        limit: i64,
    ) -> Result<Vec<RequestSummary>, Error> {
        sqlx::query_as::<_, RequestSummary>(
            r#"
            SELECT sr.id, s.name AS service_name, sr.status, sr.village, sr.landmark,
                   a.provider_phone AS assigned_provider
            FROM service_requests sr
            JOIN services s ON s.id = sr.service_id
            LEFT JOIN assignments a ON a.request_id = sr.id
            WHERE sr.customer_phone = $1
            ORDER BY sr.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_phone)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_anchor_receipt(
        &self,
        request_id: i64,
        acknowledged: bool,
    ) -> Result<(), Error> {
        sqlx::query("INSERT INTO anchor_receipts (request_id, acknowledged) VALUES ($1, $2)")
            .bind(request_id)
            .bind(acknowledged)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
