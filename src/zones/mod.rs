//! Zone directory client
//!
//! Resolves the set of zones to monitor from the directory REST API and
//! caches it across collection cycles. Refreshing replaces the cached set
//! wholesale; there is no per-entry eviction.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::models::Zone;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// An HTTP-level transport error occurred.
    #[error("zone directory request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The directory responded with a non-success HTTP status.
    #[error("zone directory returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The directory envelope reported failure (bad credentials, ...).
    #[error("zone directory rejected the request: {0}")]
    Api(String),
}

/// `{success, errors, result}` envelope the directory wraps every listing in.
#[derive(Debug, Deserialize)]
struct ZoneListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

pub struct ZoneDirectory {
    client: Client,
    config: ApiConfig,
    cache: RwLock<Vec<Zone>>,
    last_refresh: RwLock<Option<Instant>>,
    cache_ttl: Duration,
}

impl ZoneDirectory {
    pub fn new(client: Client, config: ApiConfig, cache_ttl: Duration) -> Self {
        Self {
            client,
            config,
            cache: RwLock::new(Vec::new()),
            last_refresh: RwLock::new(None),
            cache_ttl,
        }
    }

    /// Fetch the zone list from the directory, replacing the cache.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, DirectoryError> {
        let url = format!("{}/zones", self.config.zone_api_url.trim_end_matches('/'));
        debug!(%url, "fetching zone list");

        let response = self
            .client
            .get(&url)
            .header("X-AUTH-EMAIL", &self.config.email)
            .header("X-AUTH-KEY", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status { status, body });
        }

        let envelope: ZoneListEnvelope = response.json().await?;
        if !envelope.success {
            let reason = envelope
                .errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            let reason = if reason.is_empty() {
                "no error detail provided".to_owned()
            } else {
                reason
            };
            return Err(DirectoryError::Api(reason));
        }

        let zones = envelope.result;
        info!(count = zones.len(), "refreshed zone list");

        *self.cache.write().await = zones.clone();
        *self.last_refresh.write().await = Some(Instant::now());

        Ok(zones)
    }

    /// Cached zone set, refreshed when older than the configured TTL.
    pub async fn zones(&self) -> Result<Vec<Zone>, DirectoryError> {
        let fresh = {
            let last_guard = self.last_refresh.read().await;
            match *last_guard {
                Some(last) => last.elapsed() <= self.cache_ttl,
                None => false,
            }
        };

        if fresh {
            return Ok(self.cache.read().await.clone());
        }

        self.list_zones().await
    }
}

/// Display name for a zone ID, or the empty string when the directory does
/// not know it. First match wins when the set carries duplicate IDs.
pub fn resolve_name(zones: &[Zone], id: &str) -> String {
    zones
        .iter()
        .find(|z| z.id == id)
        .map(|z| z.name.clone())
        .unwrap_or_default()
}

/// Zone IDs in input order. Duplicates are preserved; deduplication, if
/// wanted, is the caller's concern.
pub fn extract_ids(zones: &[Zone]) -> Vec<String> {
    zones.iter().map(|z| z.id.clone()).collect()
}
