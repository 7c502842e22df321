//! Discord OAuth2 authorization-code provider.

use std::collections::HashMap;

use async_trait::async_trait;
use authgate_domain::{AuthResult, UserProfile};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::errors::{ProviderError, Result};
use crate::traits::Provider;

const PROVIDER_NAME: &str = "discord";
const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://discord.com/api/oauth2/authorize";
const DEFAULT_TOKEN_ENDPOINT: &str = "https://discord.com/api/oauth2/token";
const DEFAULT_USER_ENDPOINT: &str = "https://discord.com/api/users/@me";

/// Discord OAuth2 settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// OAuth2 application client id.
    pub client_id: String,
    /// OAuth2 application client secret.
    pub client_secret: String,
    /// Scopes to request, joined with spaces in the authorize URL.
    pub scopes: Vec<String>,
    /// The broker's own callback URL: `{base_url}/callback/discord`.
    pub callback_url: String,
}

/// OAuth2 authorization-code flow against Discord.
pub struct DiscordProvider {
    cfg: DiscordConfig,
    http: Client,
    authorize_endpoint: String,
    token_endpoint: String,
    user_endpoint: String,
}

impl DiscordProvider {
    /// Create a provider against the public Discord API.
    pub fn new(cfg: DiscordConfig) -> Self {
        Self {
            cfg,
            http: Client::new(),
            authorize_endpoint: DEFAULT_AUTHORIZE_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            user_endpoint: DEFAULT_USER_ENDPOINT.to_string(),
        }
    }

    /// Point the provider at alternate endpoints (proxies, test doubles).
    pub fn with_endpoints(
        mut self,
        authorize: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        self.authorize_endpoint = authorize.into();
        self.token_endpoint = token.into();
        self.user_endpoint = user.into();
        self
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        let form = [
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.cfg.callback_url.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(format!("token request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Exchange(format!("reading token response: {e}")))?;

        if status != StatusCode::OK {
            return Err(ProviderError::Exchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Exchange(format!("invalid token JSON: {e}")))?;

        if token.access_token.is_empty() {
            return Err(ProviderError::Exchange("empty access token".to_string()));
        }

        Ok(token.access_token)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(&self.user_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::UserFetch(format!("user request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::UserFetch(format!("reading user response: {e}")))?;

        if status != StatusCode::OK {
            return Err(ProviderError::UserFetch(format!(
                "user endpoint returned {status}: {body}"
            )));
        }

        let user: DiscordUser = serde_json::from_str(&body)
            .map_err(|e| ProviderError::UserFetch(format!("invalid user JSON: {e}")))?;

        Ok(user.into_profile())
    }
}

#[async_trait]
impl Provider for DiscordProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn authorize_url(&self, state_token: &str) -> Result<String> {
        let mut url = Url::parse(&self.authorize_endpoint)
            .map_err(|e| ProviderError::InvalidConfig(format!("authorize endpoint: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.cfg.client_id)
            .append_pair("redirect_uri", &self.cfg.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.cfg.scopes.join(" "))
            .append_pair("state", state_token);

        Ok(url.to_string())
    }

    async fn exchange(&self, params: &HashMap<String, String>) -> Result<AuthResult> {
        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::MissingParams)?;

        let access_token = self.exchange_code(code).await?;
        let user = self.fetch_user(&access_token).await?;

        Ok(AuthResult { user })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
}

impl DiscordUser {
    fn into_profile(self) -> UserProfile {
        let avatar_url = match self.avatar.as_deref() {
            Some(hash) if !hash.is_empty() => {
                format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash)
            }
            _ => String::new(),
        };

        let display_name = match self.global_name {
            Some(name) if !name.is_empty() => name,
            _ => self.username.clone(),
        };

        UserProfile {
            provider: PROVIDER_NAME.to_string(),
            provider_id: self.id,
            username: self.username,
            display_name,
            avatar_url,
            email: self.email.unwrap_or_default(),
        }
    }
}
