use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /providers
///
/// Registered provider names, sorted ascending.
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let mut names = state.providers.names();
    names.sort();
    Json(names)
}
