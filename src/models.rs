//! Data models shared across the collector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored network zone as reported by the zone directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// The single aggregation bucket a collection cycle queries.
///
/// `start` is truncated down to `granularity_secs` and lags "now" by the
/// upstream aggregation delay, so the bucket is closed by the time it is
/// queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub granularity_secs: i64,
}

/// Categorical axis a metric record is partitioned along.
///
/// `Scalar` marks whole-group sums (total bytes, total requests, ...) that are
/// not broken down by any dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Browser,
    HttpProtocol,
    SslProtocol,
    ContentType,
    Country,
    IpClass,
    ResponseStatus,
    ThreatPathing,
    #[serde(rename = "__scalar__")]
    Scalar,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Browser => "browser",
            Dimension::HttpProtocol => "http_protocol",
            Dimension::SslProtocol => "ssl_protocol",
            Dimension::ContentType => "content_type",
            Dimension::Country => "country",
            Dimension::IpClass => "ip_class",
            Dimension::ResponseStatus => "response_status",
            Dimension::ThreatPathing => "threat_pathing",
            Dimension::Scalar => "__scalar__",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named quantity carried by a metric record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Requests,
    Bytes,
    Threats,
    PageViews,
    Uniques,
    CachedRequests,
    CachedBytes,
    EncryptedRequests,
    EncryptedBytes,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Requests => "requests",
            Metric::Bytes => "bytes",
            Metric::Threats => "threats",
            Metric::PageViews => "page_views",
            Metric::Uniques => "uniques",
            Metric::CachedRequests => "cached_requests",
            Metric::CachedBytes => "cached_bytes",
            Metric::EncryptedRequests => "encrypted_requests",
            Metric::EncryptedBytes => "encrypted_bytes",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened data point handed to the exporter.
///
/// Every record corresponds to exactly one breakdown entry (or one scalar sum)
/// of one aggregate group in the raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub zone_id: String,

    /// Display name resolved through the zone directory; empty when the
    /// directory does not know the zone.
    pub zone_name: String,

    /// Edge location that served the traffic; only set for records produced
    /// by the per-location query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colo_code: Option<String>,

    /// Bucket timestamp exactly as reported by the analytics API.
    pub datetime: String,

    pub dimension: Dimension,

    /// Value of the dimension for this record ("US", "HTTP/2", ...); empty
    /// for scalar records.
    pub dimension_value: String,

    pub metric: Metric,
    pub value: u64,
}
