// service/error.rs
use crate::error::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request {0} not found")]
    RequestNotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RequestNotFound(_) => HttpError::not_found(err.to_string()),
            ServiceError::Validation(msg) => HttpError::bad_request(msg),
            ServiceError::Database(e) => {
                tracing::error!("database failure: {}", e);
                HttpError::server_error("Internal server error".to_string())
            }
        }
    }
}
