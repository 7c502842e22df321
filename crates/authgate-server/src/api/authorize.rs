use std::sync::Arc;

use authgate_clients::ClientError;
use authgate_domain::StatePayload;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::api::found;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
}

/// GET /auth/:provider
///
/// Validates the client, its redirect_uri, and the provider, then
/// redirects the browser to the provider's authorize URL with a signed
/// state token attached.
///
/// Check order matters: an unknown provider is a 400 regardless of
/// allowlists; provider-not-allowed is a 403 only once both the client
/// and the provider are known to exist.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, ApiError> {
    if query.client_id.is_empty() {
        return Err(ApiError::BadRequest("missing client_id parameter".to_string()));
    }
    if query.redirect_uri.is_empty() {
        return Err(ApiError::BadRequest(
            "missing redirect_uri parameter".to_string(),
        ));
    }

    if state.clients.by_id(&query.client_id).is_err() {
        return Err(ApiError::BadRequest("unknown client".to_string()));
    }

    if state
        .clients
        .validate_callback(&query.client_id, &query.redirect_uri)
        .is_err()
    {
        return Err(ApiError::BadRequest("redirect_uri not allowed".to_string()));
    }

    let provider = state
        .providers
        .get(&provider_name)
        .map_err(|_| ApiError::BadRequest("unknown provider".to_string()))?;

    match state
        .clients
        .validate_provider(&query.client_id, &provider_name)
    {
        Ok(()) => {}
        Err(ClientError::ProviderNotAllowed) => {
            return Err(ApiError::Forbidden(
                "provider not allowed for this client".to_string(),
            ));
        }
        Err(_) => return Err(ApiError::BadRequest("unknown client".to_string())),
    }

    let state_token = state
        .state_codec
        .issue(StatePayload::new(
            &query.client_id,
            &provider_name,
            &query.redirect_uri,
        ))
        .map_err(|e| ApiError::internal("generating state token", e))?;

    let auth_url = provider
        .authorize_url(&state_token)
        .map_err(|e| ApiError::internal("building provider authorize URL", e))?;

    Ok(found(&auth_url))
}
