//! Provider trait definition.

use std::collections::HashMap;

use async_trait::async_trait;
use authgate_domain::AuthResult;

use crate::errors::Result;

/// The capability set a concrete identity provider must implement to
/// participate in the flow.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable name the provider is registered and addressed under.
    fn name(&self) -> &'static str;

    /// Build the URL the user's browser is redirected to, carrying the
    /// signed state token through the provider round-trip.
    fn authorize_url(&self, state_token: &str) -> Result<String>;

    /// Perform the authoritative exchange with the provider.
    ///
    /// `params` is the flat map of query parameters the provider attached
    /// to the callback redirect. On success the user is authenticated and
    /// the normalized profile is returned.
    async fn exchange(&self, params: &HashMap<String, String>) -> Result<AuthResult>;
}
