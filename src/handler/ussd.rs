// handler/ussd.rs
use std::sync::Arc;

use axum::{
    http::header, response::IntoResponse, routing::post, Extension, Form, Router,
};
use validator::Validate;

use crate::{dtos::ussddtos::UssdRequestDto, error::HttpError, AppState};

pub fn ussd_handler() -> Router {
    Router::new().route("/", post(handle_callback))
}

/// One gateway callback in, one plain-text screen out. The response body is
/// always 200 with a "CON"/"END" prefix; only a malformed callback gets an
/// HTTP error.
pub async fn handle_callback(
    Extension(app_state): Extension<Arc<AppState>>,
    Form(body): Form<UssdRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let text = body.text.unwrap_or_default();
    let screen = app_state
        .interpreter
        .render(&body.session_id, &body.phone_number, &text)
        .await;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        screen.render(),
    ))
}
