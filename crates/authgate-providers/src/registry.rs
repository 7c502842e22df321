//! Provider name lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ProviderError, Result};
use crate::traits::Provider;

/// Maps provider names to their implementations.
///
/// Populated once at startup; read-only on the request path.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(ProviderError::Duplicate(name));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    /// Registered provider names, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}
