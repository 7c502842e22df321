use std::sync::Arc;

use authgate_domain::AuthResult;
use authgate_tokens::TokenError;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExchangeQuery {
    #[serde(default)]
    pub code: String,
}

/// GET /exchange
///
/// Server-to-server redemption of an exchange code. The caller
/// authenticates with its pre-shared API key as a Bearer token; the code
/// only redeems for the client that initiated the flow, so a leaked code
/// is useless to every other key holder.
pub async fn exchange(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExchangeQuery>,
    headers: HeaderMap,
) -> Result<Json<AuthResult>, ApiError> {
    if query.code.is_empty() {
        return Err(ApiError::BadRequest("missing code parameter".to_string()));
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let api_key = auth_header.strip_prefix("Bearer ").unwrap_or("");
    if api_key.is_empty() {
        return Err(ApiError::Unauthorized(
            "missing or invalid Authorization header".to_string(),
        ));
    }

    let payload = match state.exchange_codec.decode(&query.code) {
        Ok(payload) => payload,
        Err(TokenError::ExchangeCodeExpired) => {
            return Err(ApiError::BadRequest("exchange code expired".to_string()));
        }
        Err(_) => return Err(ApiError::BadRequest("invalid exchange code".to_string())),
    };

    let client = state
        .clients
        .by_api_key(api_key)
        .map_err(|_| ApiError::Unauthorized("invalid API key".to_string()))?;

    if client.id != payload.client_id {
        return Err(ApiError::Forbidden(
            "API key does not match the client that initiated the auth flow".to_string(),
        ));
    }

    Ok(Json(AuthResult { user: payload.user }))
}
