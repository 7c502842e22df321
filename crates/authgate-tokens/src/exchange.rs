//! AES-256-GCM sealed exchange codes.
//!
//! Wire format: `base64url(nonce || ciphertext || tag)`, no padding. The
//! code carries an authenticated user profile through the browser back to
//! the client's backend, so it must be confidential as well as
//! tamper-evident.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use authgate_domain::ExchangePayload;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::errors::{Result, TokenError};

/// Required AES-256 key length in bytes.
pub const EXCHANGE_KEY_SIZE: usize = 32;

const CODE_TTL_SECONDS: i64 = 30;
const NONCE_SIZE: usize = 12;

type NowFn = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Encrypts and decrypts expiring exchange codes.
pub struct ExchangeCodec {
    cipher: Aes256Gcm,
    ttl: Duration,
    now: NowFn,
}

impl ExchangeCodec {
    /// Create a codec with the given 32-byte AES key.
    ///
    /// Any other key length is a fatal configuration error.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != EXCHANGE_KEY_SIZE {
            return Err(TokenError::InvalidKeySize {
                expected: EXCHANGE_KEY_SIZE,
                actual: key.len(),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| TokenError::Sealing(format!("initializing AES-GCM: {e}")))?;
        Ok(Self {
            cipher,
            ttl: Duration::seconds(CODE_TTL_SECONDS),
            now: Box::new(Utc::now),
        })
    }

    /// Override the clock. Intended for expiry tests only.
    pub fn set_now(&mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) {
        self.now = Box::new(now);
    }

    /// Seal a payload into an opaque exchange code.
    ///
    /// The nonce is cryptographically random on every call. The same
    /// payload may be encoded many times under one key, and GCM nonce
    /// reuse under a fixed key breaks both confidentiality and
    /// authenticity, so the nonce must never be a counter or derived from
    /// the payload.
    pub fn encode(&self, mut payload: ExchangePayload) -> Result<String> {
        payload.expires_at = (self.now)() + self.ttl;

        let plaintext = serde_json::to_vec(&payload)
            .map_err(|e| TokenError::Sealing(format!("serializing exchange payload: {e}")))?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng()
            .try_fill_bytes(&mut nonce)
            .map_err(|e| TokenError::Sealing(format!("generating nonce: {e}")))?;

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| TokenError::Sealing("sealing exchange payload".to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Open an exchange code back into its payload.
    ///
    /// Every structural, cryptographic, or parse failure collapses to
    /// [`TokenError::ExchangeCodeInvalid`]; only a well-formed code past
    /// its expiry is distinguished.
    pub fn decode(&self, code: &str) -> Result<ExchangePayload> {
        let raw = URL_SAFE_NO_PAD
            .decode(code)
            .map_err(|_| TokenError::ExchangeCodeInvalid)?;

        if raw.len() < NONCE_SIZE {
            return Err(TokenError::ExchangeCodeInvalid);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| TokenError::ExchangeCodeInvalid)?;

        let payload: ExchangePayload =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::ExchangeCodeInvalid)?;

        if (self.now)() > payload.expires_at {
            return Err(TokenError::ExchangeCodeExpired);
        }

        Ok(payload)
    }
}
