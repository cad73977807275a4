// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{handler::ussd::ussd_handler, AppState};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/ussd", ussd_handler())
        .route("/api/healthchecker", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
