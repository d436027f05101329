use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default base URL of the zone-directory REST API.
pub const DEFAULT_ZONE_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default URL of the analytics GraphQL endpoint.
pub const DEFAULT_ANALYTICS_API_URL: &str = "https://api.cloudflare.com/client/v4/graphql/";

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub collector: CollectorConfig,
}

/// Upstream API endpoints and credentials.
///
/// Both the zone directory and the analytics endpoint authenticate with the
/// same email + key header pair, attached per request.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub email: String,
    pub api_key: String,

    /// Base URL of the zone-directory API. Override for testing against a
    /// mock server.
    pub zone_api_url: String,

    /// URL of the analytics GraphQL endpoint. Override for testing.
    pub analytics_api_url: String,

    #[serde(default = "ApiConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Seconds between collection cycles.
    pub poll_interval_secs: u64,

    /// Seconds the cached zone list stays valid before a full refresh.
    pub zone_refresh_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("email", &self.email)
            .field("api_key", &"[REDACTED]")
            .field("zone_api_url", &self.zone_api_url)
            .field("analytics_api_url", &self.analytics_api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    const fn default_request_timeout_secs() -> u64 {
        30
    }

    /// Minimal config for a given credential pair, default endpoints.
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            zone_api_url: DEFAULT_ZONE_API_URL.to_owned(),
            analytics_api_url: DEFAULT_ANALYTICS_API_URL.to_owned(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }

    /// Override the zone-directory base URL (useful for testing).
    #[must_use]
    pub fn with_zone_api_url(mut self, url: impl Into<String>) -> Self {
        self.zone_api_url = url.into();
        self
    }

    /// Override the analytics endpoint URL (useful for testing).
    #[must_use]
    pub fn with_analytics_api_url(mut self, url: impl Into<String>) -> Self {
        self.analytics_api_url = url.into();
        self
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let email = std::env::var("CF_API_EMAIL")
            .context("CF_API_EMAIL must be set to the account email")?;
        let api_key =
            std::env::var("CF_API_KEY").context("CF_API_KEY must be set to the account API key")?;

        let zone_api_url =
            std::env::var("ZONE_API_URL").unwrap_or_else(|_| DEFAULT_ZONE_API_URL.to_string());
        let analytics_api_url = std::env::var("ANALYTICS_API_URL")
            .unwrap_or_else(|_| DEFAULT_ANALYTICS_API_URL.to_string());

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(ApiConfig::default_request_timeout_secs);

        let poll_interval_secs = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()?;

        let zone_refresh_secs = std::env::var("ZONE_REFRESH_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()?;

        Ok(Config {
            api: ApiConfig {
                email,
                api_key,
                zone_api_url,
                analytics_api_url,
                request_timeout_secs,
            },
            collector: CollectorConfig {
                poll_interval_secs,
                zone_refresh_secs,
            },
        })
    }
}
