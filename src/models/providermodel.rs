use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Provider,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "provider_kind", rename_all = "snake_case")]
pub enum ProviderKind {
    Rider,
    Business,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "service_kind", rename_all = "snake_case")]
pub enum ServiceKind {
    Rider,
    Business,
    Any,
}

impl From<ProviderKind> for ServiceKind {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Rider => ServiceKind::Rider,
            ProviderKind::Business => ServiceKind::Business,
        }
    }
}

/// Durable per-caller state. The only thing that survives between session
/// calls besides the accumulated input itself; written explicitly by
/// completed sub-flows, never inferred from the token list.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct UserPrefs {
    pub phone: String,
    pub role: Option<UserRole>,
    /// Session id of the conversation that selected the role. While that
    /// conversation is still re-sending its accumulated input, the leading
    /// role token must keep being consumed to decode positions consistently.
    pub role_session: Option<String>,
    pub village: String,
    pub landmark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Provider {
    pub phone: String,
    pub kind: ProviderKind,
    pub name: String,
    pub village: String,
    pub affiliation: String,
    pub current_landmark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub kind: ServiceKind,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Landmark {
    pub id: i64,
    pub village: String,
    pub name: String,
    pub description: String,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}
