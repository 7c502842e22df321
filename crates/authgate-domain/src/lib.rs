//! Shared data model for the authgate broker.
//!
//! These types cross every boundary in the system: providers produce
//! [`UserProfile`]s, the token codecs seal [`StatePayload`]s and
//! [`ExchangePayload`]s, and the client registry holds [`ClientApp`]
//! records. None of them carry behavior; all logic lives in the crates
//! that consume them.

#![warn(missing_docs)]

pub mod types;

pub use types::{AuthResult, ClientApp, ExchangePayload, StatePayload, UserProfile};
