//! Token codec error types.

use thiserror::Error;

/// Errors produced by the state and exchange codecs.
///
/// Verification failures are deliberately coarse: a signature mismatch and
/// a garbled ciphertext both collapse to the `Invalid` variants so callers
/// cannot learn which check failed.
#[derive(Debug, Error)]
pub enum TokenError {
    /// State token is structurally broken (no separator, bad encoding,
    /// unparseable payload).
    #[error("malformed state token")]
    StateMalformed,

    /// State token signature does not verify.
    #[error("invalid state token")]
    StateInvalid,

    /// State token is past its expiry.
    #[error("expired state token")]
    StateExpired,

    /// Exchange code cannot be decoded, unsealed, or parsed.
    #[error("invalid exchange code")]
    ExchangeCodeInvalid,

    /// Exchange code is past its expiry.
    #[error("expired exchange code")]
    ExchangeCodeExpired,

    /// Key material has the wrong length.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes.
        expected: usize,
        /// Actual key size in bytes.
        actual: usize,
    },

    /// Underlying cryptographic or serialization failure while producing
    /// a token. Never returned from verification paths.
    #[error("token sealing failed: {0}")]
    Sealing(String),
}

/// Result type for token codec operations.
pub type Result<T> = std::result::Result<T, TokenError>;
