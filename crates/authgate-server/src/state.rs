use std::sync::Arc;

use anyhow::Result;
use authgate_clients::ClientRegistry;
use authgate_providers::{
    DiscordConfig, DiscordProvider, ProviderRegistry, SteamConfig, SteamProvider,
};
use authgate_tokens::{ExchangeCodec, StateCodec};

use crate::config::Config;

/// Application state shared across all handlers.
///
/// Everything here is constructed once at startup and immutable afterwards;
/// read-only access from any number of concurrent handlers needs no locks.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientRegistry>,
    pub providers: Arc<ProviderRegistry>,
    pub state_codec: Arc<StateCodec>,
    pub exchange_codec: Arc<ExchangeCodec>,
}

impl AppState {
    /// Build all services leaves-first from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clients = Arc::new(ClientRegistry::new(config.clients.clone())?);
        let state_codec = Arc::new(StateCodec::new(config.state_signing_key.as_bytes()));
        let exchange_codec = Arc::new(ExchangeCodec::new(
            config.exchange_encryption_key.as_bytes(),
        )?);

        let mut providers = ProviderRegistry::new();

        if let Some(discord) = &config.discord {
            providers.register(Arc::new(DiscordProvider::new(DiscordConfig {
                client_id: discord.client_id.clone(),
                client_secret: discord.client_secret.clone(),
                scopes: discord.scopes.clone(),
                callback_url: format!("{}/callback/discord", config.server.base_url),
            })))?;
            tracing::info!("registered provider: discord");
        }

        if let Some(steam) = &config.steam {
            providers.register(Arc::new(SteamProvider::new(SteamConfig {
                api_key: steam.api_key.clone(),
                realm: steam.realm.clone(),
                callback_url: format!("{}/callback/steam", config.server.base_url),
            })))?;
            tracing::info!("registered provider: steam");
        }

        Ok(Self {
            clients,
            providers: Arc::new(providers),
            state_codec,
            exchange_codec,
        })
    }
}
