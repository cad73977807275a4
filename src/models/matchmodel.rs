use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    Offered,
    Accepted,
    Closed,
}

impl RequestStatus {
    pub fn label(&self) -> &str {
        match self {
            RequestStatus::New => "NEW",
            RequestStatus::Offered => "OFFERED",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "offer_status", rename_all = "snake_case")]
pub enum OfferStatus {
    Offered,
    Accepted,
    Passed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ServiceRequest {
    pub id: i64,
    pub customer_phone: String,
    pub service_id: i32,
    pub village: String,
    pub landmark: String,
    pub note: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Offer {
    pub id: i64,
    pub request_id: i64,
    pub provider_phone: String,
    pub score: f64,
    pub eta_minutes: i32,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

/// The unique, immutable record of which provider won a request. Its
/// existence is definitive proof the request is already spoken for.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Assignment {
    pub id: i64,
    pub request_id: i64,
    pub provider_phone: String,
    pub assigned_at: DateTime<Utc>,
}

/// Outcome of an accept attempt. Losing the race is a business outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    NotAvailable,
}

// Read models for the menu screens.

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct PendingOffer {
    pub offer_id: i64,
    pub request_id: i64,
    pub eta_minutes: i32,
    pub village: String,
    pub landmark: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ActiveJob {
    pub request_id: i64,
    pub service_name: String,
    pub landmark: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct RequestSummary {
    pub id: i64,
    pub service_name: String,
    pub status: RequestStatus,
    pub village: String,
    pub landmark: String,
    pub assigned_provider: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CandidateProvider {
    pub phone: String,
    pub current_landmark: String,
}
