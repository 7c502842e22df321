//! HTTP handlers for the broker's five endpoints.

pub mod authorize;
pub mod callback;
pub mod exchange;
pub mod health;
pub mod providers;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// 302 redirect. Axum's `Redirect` helper only produces 303/307/308; the
/// flow contract pins 302 Found.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
