//! Core domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized user profile returned by any provider.
///
/// The JSON shape is part of the public contract: `email` is omitted when
/// empty, every other field is always present (possibly as an empty string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider name, equal to the registered provider's `name()`.
    pub provider: String,
    /// Opaque stable identifier assigned by the provider.
    pub provider_id: String,
    /// Login or persona name at the provider.
    pub username: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Fully qualified avatar URL, empty when the provider has none.
    pub avatar_url: String,
    /// Email address when the provider exposes one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

/// Result of a successful provider authentication.
///
/// Also the server-to-server response body of the exchange endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    /// The authenticated user.
    pub user: UserProfile,
}

/// Data embedded in the HMAC-signed state token.
///
/// Carries the initiating client's context across the provider redirect.
/// Field names are shortened on the wire to keep the token compact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    /// Initiating client's id.
    #[serde(rename = "cid")]
    pub client_id: String,
    /// Provider the flow was started against.
    #[serde(rename = "prv")]
    pub provider: String,
    /// Redirect URI declared at the start of the flow.
    #[serde(rename = "rdr")]
    pub redirect_uri: String,
    /// Hex-encoded 16-byte random nonce, filled in at issue time.
    #[serde(rename = "nce")]
    pub nonce: String,
    /// Absolute expiry, filled in at issue time.
    #[serde(rename = "exp")]
    pub expires_at: DateTime<Utc>,
}

impl StatePayload {
    /// Build a payload for a new flow. The nonce and expiry are placeholders
    /// until the state codec issues the token.
    pub fn new(
        client_id: impl Into<String>,
        provider: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            provider: provider.into(),
            redirect_uri: redirect_uri.into(),
            nonce: String::new(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Data encrypted inside an exchange code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePayload {
    /// Client that initiated the flow; the only client allowed to redeem.
    #[serde(rename = "cid")]
    pub client_id: String,
    /// Absolute expiry, filled in at encode time.
    #[serde(rename = "exp")]
    pub expires_at: DateTime<Utc>,
    /// The authenticated user carried back to the client.
    pub user: UserProfile,
}

impl ExchangePayload {
    /// Build a payload for an authenticated user. The expiry is a
    /// placeholder until the exchange codec encodes the code.
    pub fn new(client_id: impl Into<String>, user: UserProfile) -> Self {
        Self {
            client_id: client_id.into(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
            user,
        }
    }
}

/// A registered client application.
///
/// Records are loaded once at startup and never mutated. The API key is a
/// pre-shared secret and never serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientApp {
    /// Stable lowercase hyphenated identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// High-entropy pre-shared secret used on the exchange endpoint.
    #[serde(skip)]
    pub api_key: String,
    /// Exact-string allowlist of redirect URIs.
    pub allowed_callbacks: Vec<String>,
    /// Allowlist of provider names this client may use.
    pub allowed_providers: Vec<String>,
}
