//! Environment-variable configuration.
//!
//! Everything is read from the process environment: server settings,
//! key material, per-provider settings (a provider is enabled by the
//! presence of its distinguishing variable), and registered clients,
//! which are discovered by scanning for `CLIENT_<ID>_API_KEY` keys.

use std::collections::HashMap;

use authgate_domain::ClientApp;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// A setting is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL of this broker, used to derive provider callback URLs.
    pub base_url: String,
}

/// Discord provider settings.
#[derive(Debug, Clone)]
pub struct DiscordSettings {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

/// Steam provider settings.
#[derive(Debug, Clone)]
pub struct SteamSettings {
    pub api_key: String,
    pub realm: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// HMAC key for state tokens; arbitrary non-empty bytes.
    pub state_signing_key: String,
    /// AES key for exchange codes; must be exactly 32 bytes.
    pub exchange_encryption_key: String,
    pub discord: Option<DiscordSettings>,
    pub steam: Option<SteamSettings>,
    pub clients: Vec<ClientApp>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| vars.get(key).map(String::as_str).unwrap_or("");

        let port = match get("PORT") {
            "" => 8080,
            value => value
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("PORT must be a number: {e}")))?,
        };

        let base_url = get("BASE_URL").to_string();

        let server = ServerConfig {
            host: non_empty_or(get("HOST"), "0.0.0.0"),
            port,
            base_url: base_url.clone(),
        };

        // Discord is enabled by the presence of DISCORD_CLIENT_ID.
        let discord = match get("DISCORD_CLIENT_ID") {
            "" => None,
            client_id => Some(DiscordSettings {
                client_id: client_id.to_string(),
                client_secret: get("DISCORD_CLIENT_SECRET").to_string(),
                scopes: split_comma(&non_empty_or(get("DISCORD_SCOPES"), "identify,email")),
            }),
        };

        // Steam is enabled by the presence of STEAM_API_KEY.
        let steam = match get("STEAM_API_KEY") {
            "" => None,
            api_key => Some(SteamSettings {
                api_key: api_key.to_string(),
                realm: non_empty_or(get("STEAM_REALM"), &base_url),
            }),
        };

        let clients = discover_clients(&vars);

        let config = Config {
            server,
            state_signing_key: get("STATE_SIGNING_KEY").to_string(),
            exchange_encryption_key: get("EXCHANGE_ENCRYPTION_KEY").to_string(),
            discord,
            steam,
            clients,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.state_signing_key.is_empty() {
            return Err(ConfigError::Missing("STATE_SIGNING_KEY is required".to_string()));
        }
        if self.exchange_encryption_key.is_empty() {
            return Err(ConfigError::Missing(
                "EXCHANGE_ENCRYPTION_KEY is required".to_string(),
            ));
        }
        if self.exchange_encryption_key.len() != 32 {
            return Err(ConfigError::Invalid(format!(
                "EXCHANGE_ENCRYPTION_KEY must be exactly 32 bytes, got {}",
                self.exchange_encryption_key.len()
            )));
        }
        if self.clients.is_empty() {
            return Err(ConfigError::Missing(
                "at least one client must be configured (CLIENT_<ID>_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scan the variable set for `CLIENT_<ID>_API_KEY` keys and assemble
/// client records from the companion variables.
///
/// `CLIENT_MY_SITE_API_KEY` yields the client id `my-site`; the name,
/// callback allowlist, and provider allowlist come from
/// `CLIENT_MY_SITE_NAME`, `..._ALLOWED_CALLBACKS`, `..._ALLOWED_PROVIDERS`.
/// Results are sorted by id so registration order is deterministic.
fn discover_clients(vars: &HashMap<String, String>) -> Vec<ClientApp> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for key in vars.keys() {
        let Some(prefix) = key.strip_suffix("_API_KEY") else {
            continue;
        };
        if !prefix.starts_with("CLIENT_") {
            continue;
        }
        let id_part = &prefix["CLIENT_".len()..];
        if id_part.is_empty() {
            continue;
        }
        let id = id_part.to_lowercase().replace('_', "-");
        entries.push((prefix.to_string(), id));
    }

    entries.sort_by(|a, b| a.1.cmp(&b.1));
    entries.dedup_by(|a, b| a.1 == b.1);

    let get = |key: String| vars.get(&key).map(String::as_str).unwrap_or("");

    entries
        .into_iter()
        .filter_map(|(prefix, id)| {
            let api_key = get(format!("{prefix}_API_KEY"));
            if api_key.is_empty() {
                return None;
            }
            Some(ClientApp {
                name: non_empty_or(get(format!("{prefix}_NAME")), &id),
                api_key: api_key.to_string(),
                allowed_callbacks: split_comma(get(format!("{prefix}_ALLOWED_CALLBACKS"))),
                allowed_providers: split_comma(get(format!("{prefix}_ALLOWED_PROVIDERS"))),
                id,
            })
        })
        .collect()
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn split_comma(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal() -> Vec<(String, String)> {
        vars(&[
            ("BASE_URL", "https://auth.example.com"),
            ("STATE_SIGNING_KEY", "signing-key"),
            ("EXCHANGE_ENCRYPTION_KEY", "01234567890123456789012345678901"),
            ("CLIENT_WEBSITE_API_KEY", "web-api-key-secret"),
        ])
    }

    #[test]
    fn test_minimal_config() {
        let config = Config::from_vars(minimal()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_url, "https://auth.example.com");
        assert!(config.discord.is_none());
        assert!(config.steam.is_none());
        assert_eq!(config.clients.len(), 1);
        assert_eq!(config.clients[0].id, "website");
        assert_eq!(config.clients[0].name, "website");
        assert_eq!(config.clients[0].api_key, "web-api-key-secret");
    }

    #[test]
    fn test_missing_signing_key() {
        let mut env = minimal();
        env.retain(|(k, _)| k != "STATE_SIGNING_KEY");
        assert!(matches!(
            Config::from_vars(env),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_encryption_key_length_enforced() {
        let mut env = minimal();
        for (key, value) in &mut env {
            if key == "EXCHANGE_ENCRYPTION_KEY" {
                *value = "too-short".to_string();
            }
        }
        assert!(matches!(
            Config::from_vars(env),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_no_clients_rejected() {
        let mut env = minimal();
        env.retain(|(k, _)| k != "CLIENT_WEBSITE_API_KEY");
        assert!(matches!(
            Config::from_vars(env),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut env = minimal();
        env.push(("PORT".to_string(), "not-a-number".to_string()));
        assert!(matches!(
            Config::from_vars(env),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_discord_enabled_by_client_id() {
        let mut env = minimal();
        env.push(("DISCORD_CLIENT_ID".to_string(), "discord-id".to_string()));
        env.push(("DISCORD_CLIENT_SECRET".to_string(), "discord-secret".to_string()));

        let config = Config::from_vars(env).unwrap();
        let discord = config.discord.unwrap();
        assert_eq!(discord.client_id, "discord-id");
        assert_eq!(discord.scopes, vec!["identify", "email"]);
    }

    #[test]
    fn test_steam_realm_defaults_to_base_url() {
        let mut env = minimal();
        env.push(("STEAM_API_KEY".to_string(), "steam-key".to_string()));

        let config = Config::from_vars(env).unwrap();
        assert_eq!(config.steam.unwrap().realm, "https://auth.example.com");
    }

    #[test]
    fn test_client_discovery_naming_and_lists() {
        let mut env = minimal();
        env.extend(vars(&[
            ("CLIENT_MY_SITE_API_KEY", "my-site-key"),
            ("CLIENT_MY_SITE_NAME", "My Site"),
            (
                "CLIENT_MY_SITE_ALLOWED_CALLBACKS",
                "https://my.site/cb, https://my.site/cb2",
            ),
            ("CLIENT_MY_SITE_ALLOWED_PROVIDERS", "discord,steam"),
        ]));

        let config = Config::from_vars(env).unwrap();
        assert_eq!(config.clients.len(), 2);
        // Sorted by id.
        assert_eq!(config.clients[0].id, "my-site");
        assert_eq!(config.clients[0].name, "My Site");
        assert_eq!(
            config.clients[0].allowed_callbacks,
            vec!["https://my.site/cb", "https://my.site/cb2"]
        );
        assert_eq!(config.clients[0].allowed_providers, vec!["discord", "steam"]);
        assert_eq!(config.clients[1].id, "website");
    }

    #[test]
    fn test_client_with_empty_key_skipped() {
        let mut env = minimal();
        env.push(("CLIENT_GHOST_API_KEY".to_string(), String::new()));

        let config = Config::from_vars(env).unwrap();
        assert_eq!(config.clients.len(), 1);
        assert_eq!(config.clients[0].id, "website");
    }
}
