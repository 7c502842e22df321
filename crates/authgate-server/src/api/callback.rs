use std::collections::HashMap;
use std::sync::Arc;

use authgate_domain::ExchangePayload;
use authgate_providers::ProviderError;
use authgate_tokens::TokenError;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use url::Url;

use crate::api::found;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /callback/:provider
///
/// The provider redirects the user's browser here after authentication.
/// Verifies the state token, delegates the authoritative exchange to the
/// provider, seals the result into an exchange code, and redirects to the
/// redirect_uri the client declared at the start of the flow.
///
/// The state token arrives as a `state` query parameter for OAuth2
/// providers and embedded in `return_to` for OpenID; both land in the
/// same place on the callback.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let state_token = params
        .get("state")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing state parameter".to_string()))?;

    let state_payload = match state.state_codec.verify(state_token) {
        Ok(payload) => payload,
        Err(TokenError::StateExpired) => {
            return Err(ApiError::BadRequest("state token expired".to_string()));
        }
        Err(_) => return Err(ApiError::BadRequest("invalid state token".to_string())),
    };

    let provider = state
        .providers
        .get(&provider_name)
        .map_err(|_| ApiError::BadRequest("unknown provider".to_string()))?;

    let result = match provider.exchange(&params).await {
        Ok(result) => result,
        Err(ProviderError::MissingParams) => {
            return Err(ApiError::BadRequest(
                "missing provider parameters".to_string(),
            ));
        }
        Err(err) => {
            tracing::warn!(provider = %provider_name, error = %err, "provider exchange failed");
            return Err(ApiError::BadGateway("provider exchange failed".to_string()));
        }
    };

    let code = state
        .exchange_codec
        .encode(ExchangePayload::new(&state_payload.client_id, result.user))
        .map_err(|e| ApiError::internal("creating exchange code", e))?;

    let mut redirect = Url::parse(&state_payload.redirect_uri)
        .map_err(|e| ApiError::internal("parsing redirect URI", e))?;
    redirect.query_pairs_mut().append_pair("code", &code);

    Ok(found(redirect.as_str()))
}
