//! HMAC-signed state tokens.
//!
//! Wire format: `base64url(json_payload) + "." + base64url(hmac_sha256)`,
//! no padding on either segment. The payload is non-secret (the browser and
//! the provider both see it), so a MAC is sufficient; the `.` separator
//! allows signature comparison without re-decoding the payload.

use authgate_domain::StatePayload;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::{Result, TokenError};

type HmacSha256 = Hmac<Sha256>;

const STATE_TTL_SECONDS: i64 = 5 * 60;
const NONCE_BYTES: usize = 16;

type NowFn = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Issues and verifies HMAC-signed, expiring state tokens.
pub struct StateCodec {
    key: Vec<u8>,
    ttl: Duration,
    now: NowFn,
}

impl StateCodec {
    /// Create a codec with the given HMAC signing key.
    ///
    /// The key may be any non-empty byte string; high entropy is the
    /// caller's responsibility.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            ttl: Duration::seconds(STATE_TTL_SECONDS),
            now: Box::new(Utc::now),
        }
    }

    /// Override the clock. Intended for expiry tests only.
    pub fn set_now(&mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) {
        self.now = Box::new(now);
    }

    /// Issue a signed token for the payload.
    ///
    /// Fills in a fresh random nonce and an absolute expiry before signing;
    /// whatever the caller put in those fields is discarded.
    pub fn issue(&self, mut payload: StatePayload) -> Result<String> {
        let mut nonce = [0u8; NONCE_BYTES];
        rand::thread_rng()
            .try_fill_bytes(&mut nonce)
            .map_err(|e| TokenError::Sealing(format!("generating nonce: {e}")))?;
        payload.nonce = hex::encode(nonce);
        payload.expires_at = (self.now)() + self.ttl;

        let data = serde_json::to_vec(&payload)
            .map_err(|e| TokenError::Sealing(format!("serializing state payload: {e}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(&data);
        let sig = self.sign(encoded.as_bytes())?;

        Ok(format!("{encoded}.{sig}"))
    }

    /// Verify a token's signature and expiry, returning the payload.
    pub fn verify(&self, token: &str) -> Result<StatePayload> {
        let (encoded, sig) = token.split_once('.').ok_or(TokenError::StateMalformed)?;

        let expected = self.sign(encoded.as_bytes())?;
        if !bool::from(sig.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(TokenError::StateInvalid);
        }

        let data = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::StateMalformed)?;
        let payload: StatePayload =
            serde_json::from_slice(&data).map_err(|_| TokenError::StateMalformed)?;

        if (self.now)() > payload.expires_at {
            return Err(TokenError::StateExpired);
        }

        Ok(payload)
    }

    fn sign(&self, data: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TokenError::Sealing(format!("initializing HMAC: {e}")))?;
        mac.update(data);
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}
