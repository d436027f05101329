//! Raw analytics response model
//!
//! Mirrors the nested GraphQL envelope: viewer → zones → aggregate groups,
//! each group a (dimensions, sums, uniques) tuple keyed by zone tag and
//! bucket datetime (plus colo code for the per-location family).
//!
//! Dimension-value fields are deserialized as `Option` so that one malformed
//! breakdown entry shows up as a mapping problem in that breakdown alone
//! instead of failing the decode of the whole response.

use serde::Deserialize;

use crate::models::{Dimension, Metric};

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

/// Top-level GraphQL envelope: `data` and/or `errors`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<AnalyticsData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsData {
    pub viewer: Viewer,
}

#[derive(Debug, Default, Deserialize)]
pub struct Viewer {
    #[serde(default)]
    pub zones: Vec<ZoneAggregates>,
}

/// Aggregates for one zone. Only one of the two group lists is populated,
/// depending on which query family was issued.
#[derive(Debug, Deserialize)]
pub struct ZoneAggregates {
    #[serde(rename = "zoneTag", default)]
    pub zone_tag: String,

    #[serde(rename = "httpRequests1mGroups", default)]
    pub groups: Vec<ZoneGroup>,

    #[serde(rename = "httpRequests1mByColoGroups", default)]
    pub colo_groups: Vec<ColoGroup>,
}

/// One whole-zone aggregate bucket.
#[derive(Debug, Deserialize)]
pub struct ZoneGroup {
    #[serde(default)]
    pub dimensions: ZoneKey,
    #[serde(rename = "uniq", default)]
    pub unique: UniqueCount,
    #[serde(default)]
    pub sum: ZoneSum,
}

#[derive(Debug, Default, Deserialize)]
pub struct ZoneKey {
    #[serde(default)]
    pub datetime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UniqueCount {
    #[serde(default)]
    pub uniques: u64,
}

/// One per-edge-location aggregate bucket.
#[derive(Debug, Deserialize)]
pub struct ColoGroup {
    #[serde(default)]
    pub dimensions: ColoKey,
    #[serde(default)]
    pub sum: ColoSum,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColoKey {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(rename = "coloCode", default)]
    pub colo_code: Option<String>,
}

/// Summed metrics of a whole-zone group: scalar totals plus the eight
/// dimension breakdowns.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ZoneSum {
    pub requests: u64,
    pub bytes: u64,
    #[serde(rename = "cachedRequests")]
    pub cached_requests: u64,
    #[serde(rename = "cachedBytes")]
    pub cached_bytes: u64,
    #[serde(rename = "encryptedRequests")]
    pub encrypted_requests: u64,
    #[serde(rename = "encryptedBytes")]
    pub encrypted_bytes: u64,
    #[serde(rename = "pageViews")]
    pub page_views: u64,
    pub threats: u64,

    #[serde(rename = "browserMap")]
    pub browser_map: Vec<BrowserEntry>,
    #[serde(rename = "clientHTTPVersionMap")]
    pub http_version_map: Vec<HttpVersionEntry>,
    #[serde(rename = "clientSSLMap")]
    pub ssl_map: Vec<SslEntry>,
    #[serde(rename = "contentTypeMap")]
    pub content_type_map: Vec<ContentTypeEntry>,
    #[serde(rename = "countryMap")]
    pub country_map: Vec<CountryEntry>,
    #[serde(rename = "ipClassMap")]
    pub ip_class_map: Vec<IpClassEntry>,
    #[serde(rename = "responseStatusMap")]
    pub response_status_map: Vec<ResponseStatusEntry>,
    #[serde(rename = "threatPathingMap")]
    pub threat_pathing_map: Vec<ThreatPathingEntry>,
}

/// Summed metrics of a per-location group; the per-location family reports a
/// smaller scalar set and only three breakdowns.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColoSum {
    pub requests: u64,
    pub bytes: u64,
    #[serde(rename = "cachedRequests")]
    pub cached_requests: u64,
    #[serde(rename = "cachedBytes")]
    pub cached_bytes: u64,

    #[serde(rename = "countryMap")]
    pub country_map: Vec<ColoCountryEntry>,
    #[serde(rename = "responseStatusMap")]
    pub response_status_map: Vec<ResponseStatusEntry>,
    #[serde(rename = "threatPathingMap")]
    pub threat_pathing_map: Vec<ThreatPathingEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BrowserEntry {
    #[serde(rename = "pageViews")]
    pub page_views: u64,
    #[serde(rename = "uaBrowserFamily")]
    pub ua_browser_family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HttpVersionEntry {
    #[serde(rename = "clientHTTPProtocol")]
    pub client_http_protocol: Option<String>,
    pub requests: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SslEntry {
    #[serde(rename = "clientSSLProtocol")]
    pub client_ssl_protocol: Option<String>,
    pub requests: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentTypeEntry {
    pub bytes: u64,
    pub requests: u64,
    #[serde(rename = "edgeResponseContentTypeName")]
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CountryEntry {
    #[serde(rename = "clientCountryName")]
    pub client_country_name: Option<String>,
    pub bytes: u64,
    pub requests: u64,
    pub threats: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColoCountryEntry {
    #[serde(rename = "clientCountryName")]
    pub client_country_name: Option<String>,
    pub requests: u64,
    pub threats: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IpClassEntry {
    #[serde(rename = "ipType")]
    pub ip_type: Option<String>,
    pub requests: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponseStatusEntry {
    #[serde(rename = "edgeResponseStatus")]
    pub edge_response_status: Option<i64>,
    pub requests: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThreatPathingEntry {
    #[serde(rename = "threatPathingName")]
    pub threat_pathing_name: Option<String>,
    pub requests: u64,
}

/// One dimension's partition of a group's traffic, in a shape the mapper can
/// walk without knowing the concrete dimension.
#[derive(Debug)]
pub struct Breakdown {
    pub dimension: Dimension,
    pub entries: Vec<BreakdownEntry>,
}

/// A single `(dimension value, metrics)` row of a breakdown. `value` is
/// `None` when the API omitted the dimension value for the row.
#[derive(Debug)]
pub struct BreakdownEntry {
    pub value: Option<String>,
    pub metrics: Vec<(Metric, u64)>,
}

impl ZoneSum {
    /// Scalar (non-breakdown) totals of this group.
    pub fn scalars(&self) -> Vec<(Metric, u64)> {
        vec![
            (Metric::Requests, self.requests),
            (Metric::Bytes, self.bytes),
            (Metric::CachedRequests, self.cached_requests),
            (Metric::CachedBytes, self.cached_bytes),
            (Metric::EncryptedRequests, self.encrypted_requests),
            (Metric::EncryptedBytes, self.encrypted_bytes),
            (Metric::PageViews, self.page_views),
            (Metric::Threats, self.threats),
        ]
    }

    /// All dimension breakdowns of this group as uniform entry lists.
    pub fn breakdowns(&self) -> Vec<Breakdown> {
        vec![
            Breakdown {
                dimension: Dimension::Browser,
                entries: self
                    .browser_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.ua_browser_family.clone(),
                        metrics: vec![(Metric::PageViews, e.page_views)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::HttpProtocol,
                entries: self
                    .http_version_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.client_http_protocol.clone(),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::SslProtocol,
                entries: self
                    .ssl_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.client_ssl_protocol.clone(),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::ContentType,
                entries: self
                    .content_type_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.content_type.clone(),
                        metrics: vec![(Metric::Requests, e.requests), (Metric::Bytes, e.bytes)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::Country,
                entries: self
                    .country_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.client_country_name.clone(),
                        metrics: vec![
                            (Metric::Requests, e.requests),
                            (Metric::Bytes, e.bytes),
                            (Metric::Threats, e.threats),
                        ],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::IpClass,
                entries: self
                    .ip_class_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.ip_type.clone(),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::ResponseStatus,
                entries: self
                    .response_status_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.edge_response_status.map(|s| s.to_string()),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::ThreatPathing,
                entries: self
                    .threat_pathing_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.threat_pathing_name.clone(),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
        ]
    }
}

impl ColoSum {
    /// Scalar totals reported by the per-location family.
    pub fn scalars(&self) -> Vec<(Metric, u64)> {
        vec![
            (Metric::Requests, self.requests),
            (Metric::Bytes, self.bytes),
            (Metric::CachedRequests, self.cached_requests),
            (Metric::CachedBytes, self.cached_bytes),
        ]
    }

    pub fn breakdowns(&self) -> Vec<Breakdown> {
        vec![
            Breakdown {
                dimension: Dimension::Country,
                entries: self
                    .country_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.client_country_name.clone(),
                        metrics: vec![
                            (Metric::Requests, e.requests),
                            (Metric::Threats, e.threats),
                        ],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::ResponseStatus,
                entries: self
                    .response_status_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.edge_response_status.map(|s| s.to_string()),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
            Breakdown {
                dimension: Dimension::ThreatPathing,
                entries: self
                    .threat_pathing_map
                    .iter()
                    .map(|e| BreakdownEntry {
                        value: e.threat_pathing_name.clone(),
                        metrics: vec![(Metric::Requests, e.requests)],
                    })
                    .collect(),
            },
        ]
    }
}
