//! Client app lookup and allowlist validation.

use std::collections::HashMap;

use authgate_domain::ClientApp;
use subtle::ConstantTimeEq;

use crate::errors::{ClientError, Result};

/// Immutable registry of client applications, built once at startup.
pub struct ClientRegistry {
    by_id: HashMap<String, ClientApp>,
}

impl ClientRegistry {
    /// Build a registry from the configured client records.
    ///
    /// Fails if two records share an id.
    pub fn new(clients: Vec<ClientApp>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(clients.len());
        for client in clients {
            if by_id.contains_key(&client.id) {
                return Err(ClientError::DuplicateClientId(client.id));
            }
            by_id.insert(client.id.clone(), client);
        }
        Ok(Self { by_id })
    }

    /// Look up a client by id.
    pub fn by_id(&self, client_id: &str) -> Result<&ClientApp> {
        self.by_id.get(client_id).ok_or(ClientError::NotFound)
    }

    /// Look up a client by API key.
    ///
    /// Every registered key is compared with a constant-time equality
    /// primitive, and the scan always visits the full set, recording the
    /// first match instead of returning early. The total work therefore
    /// does not depend on which key matched or whether any did.
    pub fn by_api_key(&self, api_key: &str) -> Result<&ClientApp> {
        let mut found: Option<&ClientApp> = None;
        for client in self.by_id.values() {
            let matches: bool = client
                .api_key
                .as_bytes()
                .ct_eq(api_key.as_bytes())
                .into();
            if matches && found.is_none() {
                found = Some(client);
            }
        }
        found.ok_or(ClientError::InvalidApiKey)
    }

    /// Check that a redirect URI is on the client's allowlist.
    ///
    /// Comparison is exact string equality; no normalization, no wildcards.
    pub fn validate_callback(&self, client_id: &str, callback_uri: &str) -> Result<()> {
        let client = self.by_id(client_id)?;
        if client.allowed_callbacks.iter().any(|c| c == callback_uri) {
            Ok(())
        } else {
            Err(ClientError::CallbackNotAllowed)
        }
    }

    /// Check that a provider is on the client's allowlist.
    pub fn validate_provider(&self, client_id: &str, provider: &str) -> Result<()> {
        let client = self.by_id(client_id)?;
        if client.allowed_providers.iter().any(|p| p == provider) {
            Ok(())
        } else {
            Err(ClientError::ProviderNotAllowed)
        }
    }
}
