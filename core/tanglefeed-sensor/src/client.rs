//! NetAtmo public-data API client.
//!
//! Performs a one-time OAuth2 password-grant credential exchange, keeps
//! the resulting token as explicit owned state on the client, and fetches
//! one public-data JSON payload per call. An expired token (with a 60 s
//! renewal buffer) renews automatically, via the refresh-token grant when
//! one is held and the full credential exchange otherwise; callers can
//! also force a refresh.

use std::time::{Duration, SystemTime};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SensorError, SensorResult};

/// Credentials and endpoint for the sensor provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Base URL of the provider API.
    pub base_url: String,
}

impl SensorConfig {
    /// The production provider endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.netatmo.com";
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Bounding-box query for the public-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicDataQuery {
    pub lat_ne: f64,
    pub lon_ne: f64,
    pub lat_sw: f64,
    pub lon_sw: f64,
    pub filter: bool,
    pub required_data: String,
}

impl Default for PublicDataQuery {
    fn default() -> Self {
        Self {
            lat_ne: 3.0,
            lon_ne: 4.0,
            lat_sw: -2.0,
            lon_sw: -2.0,
            filter: true,
            required_data: "temperature".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    refresh_token: Option<String>,
    expires_at: Option<SystemTime>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| SystemTime::now() > exp)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// Client for the sensor provider's public-data API.
#[derive(Debug)]
pub struct SensorClient {
    config: SensorConfig,
    client: Client,
    token: Option<AccessToken>,
}

impl SensorClient {
    /// Creates an unauthenticated client; the credential exchange happens
    /// lazily on the first fetch.
    pub fn new(config: SensorConfig) -> SensorResult<Self> {
        if config.base_url.is_empty() {
            return Err(SensorError::Config("base URL must not be empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            config,
            client,
            token: None,
        })
    }

    /// Whether a (possibly expired) access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Discards any held token and re-runs the credential exchange.
    pub async fn force_refresh(&mut self) -> SensorResult<()> {
        self.token = None;
        self.fetch_access_token().await
    }

    /// Fetches one public-data payload for the given bounding box.
    ///
    /// Authenticates first if no valid token is held. A non-200 reply
    /// surfaces as [`SensorError::Api`] with the parsed body attached.
    pub async fn get_public_data(
        &mut self,
        query: &PublicDataQuery,
    ) -> SensorResult<serde_json::Value> {
        let needs_token = self.token.as_ref().is_none_or(AccessToken::is_expired);
        if needs_token {
            self.renew_token().await?;
        }
        let token = self
            .token
            .as_ref()
            .map(|t| t.token.clone())
            .ok_or_else(|| SensorError::Auth("no access token held".into()))?;

        let response = self
            .client
            .get(format!("{}/api/getpublicdata", self.config.base_url))
            .query(query)
            .query(&[("access_token", token.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            return Err(SensorError::Api {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), "fetched public sensor data");
        Ok(body)
    }

    /// Obtains a fresh token, preferring the refresh-token grant when one
    /// is held. A rejected refresh falls back to the full exchange.
    async fn renew_token(&mut self) -> SensorResult<()> {
        let refresh = self.token.as_ref().and_then(|t| t.refresh_token.clone());
        if let Some(refresh_token) = refresh {
            match self.refresh_access_token(&refresh_token).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!(error = %e, "token refresh rejected; re-running the credential exchange");
                }
            }
        }
        self.fetch_access_token().await
    }

    /// Runs the OAuth2 refresh-token grant and stores the new token.
    async fn refresh_access_token(&mut self, refresh_token: &str) -> SensorResult<()> {
        debug!(base_url = %self.config.base_url, "renewing sensor access token");
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.config.base_url))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(SensorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SensorError::Auth(format!("unparseable token response: {e}")))?;
        self.store_token(token, Some(refresh_token.to_string()));
        Ok(())
    }

    /// Runs the OAuth2 password-grant exchange and stores the token.
    async fn fetch_access_token(&mut self) -> SensorResult<()> {
        debug!(base_url = %self.config.base_url, "exchanging sensor credentials");
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.config.base_url))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
                ("scope", "read_station"),
                ("grant_type", "password"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(SensorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SensorError::Auth(format!("unparseable token response: {e}")))?;
        self.store_token(token, None);
        Ok(())
    }

    fn store_token(&mut self, response: TokenResponse, previous_refresh: Option<String>) {
        // 60 s buffer so a token is renewed before it actually lapses.
        let expires_at = response
            .expires_in
            .map(|secs| SystemTime::now() + Duration::from_secs(secs.saturating_sub(60)));
        self.token = Some(AccessToken {
            token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at,
        });
    }
}
