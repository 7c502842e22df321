//! Client registry error types.

use thiserror::Error;

/// Errors produced by client lookup and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No client registered under the given id.
    #[error("client not found")]
    NotFound,

    /// API key does not belong to any registered client.
    #[error("invalid API key")]
    InvalidApiKey,

    /// Redirect URI is not on the client's allowlist.
    #[error("callback URI not allowed")]
    CallbackNotAllowed,

    /// Provider is not on the client's allowlist.
    #[error("provider not allowed for this client")]
    ProviderNotAllowed,

    /// Two client records share an id.
    #[error("duplicate client id: {0}")]
    DuplicateClientId(String),
}

/// Result type for client registry operations.
pub type Result<T> = std::result::Result<T, ClientError>;
