//! Provider error types.

use thiserror::Error;

/// Errors produced by provider lookups and exchanges.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider registered under the given name.
    #[error("provider not found")]
    NotFound,

    /// A provider with the same name is already registered.
    #[error("duplicate provider registration: {0}")]
    Duplicate(String),

    /// The callback request is missing parameters the provider requires.
    #[error("missing required provider parameters")]
    MissingParams,

    /// The authoritative exchange with the provider failed.
    #[error("provider exchange failed: {0}")]
    Exchange(String),

    /// The provider authenticated the user but the profile fetch failed.
    #[error("failed to fetch user from provider: {0}")]
    UserFetch(String),

    /// Provider settings cannot produce a usable URL.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
