//! Front-door key check for the listing routes.
//!
//! - When `FUNCTION_KEY` is unset, every request passes.
//! - Otherwise the caller must present the key in the `x-functions-key`
//!   header or the `code` query parameter.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::envelope::{ErrorEnvelope, PrettyJson};
use super::routes::AppState;
use crate::util::constant_time_eq;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

fn code_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
}

fn presented_key(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().query().and_then(code_param))
}

pub async fn require_function_key(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.config.function_key.as_deref() else {
        return next.run(req).await;
    };

    match presented_key(&req) {
        Some(key) if constant_time_eq(key.trim(), expected) => next.run(req).await,
        Some(_) => {
            tracing::warn!("Rejected request to {} with an invalid key", req.uri().path());
            unauthorized("Invalid function key")
        }
        None => unauthorized("Missing function key"),
    }
}

fn unauthorized(message: &str) -> Response {
    PrettyJson(StatusCode::UNAUTHORIZED, ErrorEnvelope::new(message)).into_response()
}
