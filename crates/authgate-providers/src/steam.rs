//! Steam OpenID 2.0 provider.
//!
//! Steam has no OAuth; it speaks OpenID 2.0 in stateless mode. The broker
//! redirects to the Steam login page, and on callback re-POSTs the signed
//! assertion back to Steam with `check_authentication`; Steam's answer is
//! the only evidence the user actually logged in.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use authgate_domain::{AuthResult, UserProfile};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::errors::{ProviderError, Result};
use crate::traits::Provider;

const PROVIDER_NAME: &str = "steam";
const DEFAULT_OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
const DEFAULT_PLAYER_SUMMARY_ENDPOINT: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2/";

const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Anchored so a claimed_id pointing anywhere but the Steam community host
/// can never yield an id.
static STEAM_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://steamcommunity\.com/openid/id/(\d+)$").expect("steam id pattern")
});

/// Steam OpenID settings.
#[derive(Debug, Clone)]
pub struct SteamConfig {
    /// Steam Web API key for the player summary lookup.
    pub api_key: String,
    /// OpenID realm presented on the Steam login page.
    pub realm: String,
    /// The broker's own callback URL: `{base_url}/callback/steam`.
    pub callback_url: String,
}

/// OpenID 2.0 stateless verification against Steam.
pub struct SteamProvider {
    cfg: SteamConfig,
    http: Client,
    openid_endpoint: String,
    player_summary_endpoint: String,
}

impl SteamProvider {
    /// Create a provider against the public Steam endpoints.
    pub fn new(cfg: SteamConfig) -> Self {
        Self {
            cfg,
            http: Client::new(),
            openid_endpoint: DEFAULT_OPENID_ENDPOINT.to_string(),
            player_summary_endpoint: DEFAULT_PLAYER_SUMMARY_ENDPOINT.to_string(),
        }
    }

    /// Point the provider at alternate endpoints (proxies, test doubles).
    pub fn with_endpoints(
        mut self,
        openid: impl Into<String>,
        player_summary: impl Into<String>,
    ) -> Self {
        self.openid_endpoint = openid.into();
        self.player_summary_endpoint = player_summary.into();
        self
    }

    /// Re-POST the assertion to Steam with `check_authentication`.
    ///
    /// All `openid.*` parameters are forwarded verbatim except the mode.
    async fn validate_assertion(&self, params: &HashMap<String, String>) -> Result<()> {
        let mut verify: Vec<(&str, &str)> = params
            .iter()
            .filter(|(key, _)| key.starts_with("openid.") && *key != "openid.mode")
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        verify.push(("openid.mode", "check_authentication"));

        let response = self
            .http
            .post(&self.openid_endpoint)
            .form(&verify)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(format!("verification request: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Exchange(format!("reading verification response: {e}")))?;

        if !assertion_is_valid(&body) {
            return Err(ProviderError::Exchange("assertion not valid".to_string()));
        }

        Ok(())
    }

    async fn fetch_player_summary(&self, steam_id: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(&self.player_summary_endpoint)
            .query(&[("key", self.cfg.api_key.as_str()), ("steamids", steam_id)])
            .send()
            .await
            .map_err(|e| ProviderError::UserFetch(format!("player summary request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::UserFetch(format!("reading player summary: {e}")))?;

        if status != StatusCode::OK {
            return Err(ProviderError::UserFetch(format!(
                "player summary endpoint returned {status}: {body}"
            )));
        }

        let summary: PlayerSummaryResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::UserFetch(format!("invalid player summary JSON: {e}")))?;

        let player = summary
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::UserFetch("no player data returned".to_string()))?;

        Ok(UserProfile {
            provider: PROVIDER_NAME.to_string(),
            provider_id: player.steamid,
            username: player.personaname.clone(),
            display_name: player.personaname,
            avatar_url: player.avatarfull,
            email: String::new(),
        })
    }
}

#[async_trait]
impl Provider for SteamProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn authorize_url(&self, state_token: &str) -> Result<String> {
        // OpenID has no state parameter; the token rides in return_to.
        let mut return_to = Url::parse(&self.cfg.callback_url)
            .map_err(|e| ProviderError::InvalidConfig(format!("callback URL: {e}")))?;
        return_to
            .query_pairs_mut()
            .append_pair("state", state_token);

        let mut url = Url::parse(&self.openid_endpoint)
            .map_err(|e| ProviderError::InvalidConfig(format!("openid endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("openid.ns", OPENID_NS)
            .append_pair("openid.mode", "checkid_setup")
            .append_pair("openid.return_to", return_to.as_str())
            .append_pair("openid.realm", &self.cfg.realm)
            .append_pair("openid.identity", IDENTIFIER_SELECT)
            .append_pair("openid.claimed_id", IDENTIFIER_SELECT);

        Ok(url.to_string())
    }

    async fn exchange(&self, params: &HashMap<String, String>) -> Result<AuthResult> {
        let claimed_id = params
            .get("openid.claimed_id")
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingParams)?;

        self.validate_assertion(params).await?;

        let steam_id = extract_steam_id(claimed_id)?;
        let user = self.fetch_player_summary(&steam_id).await?;

        Ok(AuthResult { user })
    }
}

/// Parse the `check_authentication` response body.
///
/// The body is `key:value` lines; validity requires an `is_valid` line
/// whose value is exactly `true`.
fn assertion_is_valid(body: &str) -> bool {
    body.lines()
        .filter_map(|line| line.split_once(':'))
        .any(|(key, value)| key.trim() == "is_valid" && value.trim() == "true")
}

fn extract_steam_id(claimed_id: &str) -> Result<String> {
    STEAM_ID_PATTERN
        .captures(claimed_id)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| {
            ProviderError::Exchange(format!("cannot extract Steam ID from {claimed_id:?}"))
        })
}

#[derive(Debug, Deserialize)]
struct PlayerSummaryResponse {
    response: PlayerList,
}

#[derive(Debug, Deserialize)]
struct PlayerList {
    #[serde(default)]
    players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
struct Player {
    steamid: String,
    personaname: String,
    #[serde(default)]
    avatarfull: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> SteamConfig {
        SteamConfig {
            api_key: "test-steam-api-key".to_string(),
            realm: "https://auth.example.com".to_string(),
            callback_url: "https://auth.example.com/callback/steam".to_string(),
        }
    }

    fn provider_against(server: &MockServer) -> SteamProvider {
        SteamProvider::new(config()).with_endpoints(
            format!("{}/openid/login", server.uri()),
            format!("{}/ISteamUser/GetPlayerSummaries/v2/", server.uri()),
        )
    }

    fn callback_params(claimed_id: &str) -> HashMap<String, String> {
        HashMap::from([
            ("openid.ns".to_string(), OPENID_NS.to_string()),
            ("openid.mode".to_string(), "id_res".to_string()),
            ("openid.claimed_id".to_string(), claimed_id.to_string()),
            ("openid.sig".to_string(), "signature".to_string()),
            ("state".to_string(), "state-token".to_string()),
        ])
    }

    #[test]
    fn test_authorize_url_openid_params() {
        let provider = SteamProvider::new(config());
        let url = Url::parse(&provider.authorize_url("test-state-token").unwrap()).unwrap();

        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["openid.ns"], OPENID_NS);
        assert_eq!(query["openid.mode"], "checkid_setup");
        assert_eq!(query["openid.realm"], "https://auth.example.com");
        assert_eq!(query["openid.identity"], IDENTIFIER_SELECT);
        assert_eq!(query["openid.claimed_id"], IDENTIFIER_SELECT);
    }

    #[test]
    fn test_authorize_url_embeds_state_in_return_to() {
        let provider = SteamProvider::new(config());
        let url = Url::parse(&provider.authorize_url("my-state-token").unwrap()).unwrap();

        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        let return_to = Url::parse(&query["openid.return_to"]).unwrap();
        assert_eq!(return_to.host_str(), Some("auth.example.com"));
        assert_eq!(return_to.path(), "/callback/steam");

        let return_query: HashMap<_, _> = return_to.query_pairs().into_owned().collect();
        assert_eq!(return_query["state"], "my-state-token");
    }

    #[test]
    fn test_assertion_parsing() {
        assert!(assertion_is_valid("ns:http://specs.openid.net/auth/2.0\nis_valid:true\n"));
        assert!(!assertion_is_valid("ns:http://specs.openid.net/auth/2.0\nis_valid:false\n"));
        // A stray mention elsewhere in the body must not count.
        assert!(!assertion_is_valid("note:is_valid:true looks odd\n"));
        assert!(!assertion_is_valid(""));
    }

    #[test]
    fn test_extract_steam_id() {
        assert_eq!(
            extract_steam_id("https://steamcommunity.com/openid/id/76561197960287930").unwrap(),
            "76561197960287930"
        );
        assert_eq!(
            extract_steam_id("http://steamcommunity.com/openid/id/123").unwrap(),
            "123"
        );
        assert!(extract_steam_id("https://evil.com/openid/id/123").is_err());
        assert!(extract_steam_id("https://evil.com/?u=https://steamcommunity.com/openid/id/123")
            .is_err());
        assert!(extract_steam_id("https://steamcommunity.com/openid/id/notanumber").is_err());
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openid/login"))
            .and(body_string_contains("openid.mode=check_authentication"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ISteamUser/GetPlayerSummaries/v2/"))
            .and(query_param("key", "test-steam-api-key"))
            .and(query_param("steamids", "76561197960287930"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {
                    "players": [{
                        "steamid": "76561197960287930",
                        "personaname": "GabeN",
                        "avatarfull": "https://avatars.steamstatic.com/full.jpg"
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_against(&server)
            .exchange(&callback_params(
                "https://steamcommunity.com/openid/id/76561197960287930",
            ))
            .await
            .unwrap();

        assert_eq!(result.user.provider, "steam");
        assert_eq!(result.user.provider_id, "76561197960287930");
        assert_eq!(result.user.username, "GabeN");
        assert_eq!(result.user.display_name, "GabeN");
        assert_eq!(
            result.user.avatar_url,
            "https://avatars.steamstatic.com/full.jpg"
        );
        assert_eq!(result.user.email, "");
    }

    #[tokio::test]
    async fn test_exchange_missing_claimed_id() {
        let server = MockServer::start().await;
        let provider = provider_against(&server);

        let result = provider.exchange(&HashMap::new()).await;
        assert!(matches!(result, Err(ProviderError::MissingParams)));

        let result = provider.exchange(&callback_params("")).await;
        assert!(matches!(result, Err(ProviderError::MissingParams)));
    }

    #[tokio::test]
    async fn test_exchange_invalid_assertion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openid/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n",
            ))
            .mount(&server)
            .await;

        let result = provider_against(&server)
            .exchange(&callback_params(
                "https://steamcommunity.com/openid/id/76561197960287930",
            ))
            .await;
        assert!(matches!(result, Err(ProviderError::Exchange(_))));
    }

    #[tokio::test]
    async fn test_exchange_foreign_claimed_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openid/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("is_valid:true\n"),
            )
            .mount(&server)
            .await;

        let result = provider_against(&server)
            .exchange(&callback_params("https://evil.com/openid/id/123"))
            .await;
        assert!(matches!(result, Err(ProviderError::Exchange(_))));
    }

    #[tokio::test]
    async fn test_exchange_empty_player_list() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openid/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("is_valid:true\n"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ISteamUser/GetPlayerSummaries/v2/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": {"players": []}})),
            )
            .mount(&server)
            .await;

        let result = provider_against(&server)
            .exchange(&callback_params(
                "https://steamcommunity.com/openid/id/76561197960287930",
            ))
            .await;
        assert!(matches!(result, Err(ProviderError::UserFetch(_))));
    }
}
