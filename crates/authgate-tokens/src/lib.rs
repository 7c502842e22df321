//! Token codecs for the authgate broker.
//!
//! Two independent artifacts let the broker stay stateless across the
//! provider round-trip:
//!
//! - [`StateCodec`] signs an expiring [`StatePayload`] with HMAC-SHA256.
//!   The payload is visible to the browser and the provider, so integrity
//!   is required but confidentiality is not.
//! - [`ExchangeCodec`] seals an expiring [`ExchangePayload`] with
//!   AES-256-GCM. The user profile inside must stay confidential while the
//!   code transits the browser.
//!
//! [`StatePayload`]: authgate_domain::StatePayload
//! [`ExchangePayload`]: authgate_domain::ExchangePayload

#![warn(missing_docs)]

pub mod errors;
pub mod exchange;
pub mod state;

pub use errors::{Result, TokenError};
pub use exchange::{ExchangeCodec, EXCHANGE_KEY_SIZE};
pub use state::StateCodec;
