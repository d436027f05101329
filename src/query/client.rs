//! Analytics query client
//!
//! Issues the two parameterized aggregate queries (whole-zone and
//! per-edge-location) against the analytics GraphQL endpoint. The client
//! holds no session state; both credential headers are attached to every
//! request independently.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::TimeWindow;
use crate::query::response::{AnalyticsData, Envelope};

/// Result-count ceiling passed as the `$limit` variable. High enough that the
/// server never truncates a single one-minute bucket for the expected zone
/// counts.
const RESULT_LIMIT: u32 = 9999;

/// Whole-zone aggregate query: one group per zone per bucket.
const ZONE_TOTALS_QUERY: &str = r#"
query ($zoneIDs: [String!], $time: Time!, $limit: Int!) {
    viewer {
        zones(filter: { zoneTag_in: $zoneIDs }) {
            zoneTag

            httpRequests1mGroups(
                limit: $limit
                filter: { datetime: $time }
            ) {
                uniq {
                    uniques
                }
                sum {
                    browserMap {
                        pageViews
                        uaBrowserFamily
                    }
                    bytes
                    cachedBytes
                    cachedRequests
                    clientHTTPVersionMap {
                        clientHTTPProtocol
                        requests
                    }
                    clientSSLMap {
                        clientSSLProtocol
                        requests
                    }
                    contentTypeMap {
                        bytes
                        requests
                        edgeResponseContentTypeName
                    }
                    countryMap {
                        bytes
                        clientCountryName
                        requests
                        threats
                    }
                    encryptedBytes
                    encryptedRequests
                    ipClassMap {
                        ipType
                        requests
                    }
                    pageViews
                    requests
                    responseStatusMap {
                        edgeResponseStatus
                        requests
                    }
                    threatPathingMap {
                        requests
                        threatPathingName
                    }
                    threats
                }
                dimensions {
                    datetime
                }
            }
        }
    }
}
"#;

/// Per-edge-location aggregate query: same filter, grouped additionally by
/// colo code. The endpoint reports one grouping family per invocation, so
/// this cannot be merged with the whole-zone query.
const COLO_TOTALS_QUERY: &str = r#"
query ($zoneIDs: [String!], $time: Time!, $limit: Int!) {
    viewer {
        zones(filter: { zoneTag_in: $zoneIDs }) {
            zoneTag

            httpRequests1mByColoGroups(
                limit: $limit
                filter: { datetime: $time }
            ) {
                sum {
                    requests
                    bytes
                    countryMap {
                        clientCountryName
                        requests
                        threats
                    }
                    responseStatusMap {
                        edgeResponseStatus
                        requests
                    }
                    cachedRequests
                    cachedBytes
                    threatPathingMap {
                        requests
                        threatPathingName
                    }
                }
                dimensions {
                    coloCode
                    datetime
                }
            }
        }
    }
}
"#;

#[derive(Debug, Error)]
pub enum QueryError {
    /// An HTTP-level transport error occurred.
    #[error("analytics request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint responded with a non-success HTTP status.
    #[error("analytics API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response envelope carried GraphQL-level errors. Partial data next
    /// to errors counts as a failure; no records are produced from it.
    #[error("analytics API returned errors: {0}")]
    Api(String),

    /// A success envelope with neither data nor errors.
    #[error("analytics response contained no data")]
    MissingData,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
struct Variables<'a> {
    #[serde(rename = "zoneIDs")]
    zone_ids: &'a [String],
    time: DateTime<Utc>,
    limit: u32,
}

pub struct AnalyticsClient {
    client: Client,
    config: ApiConfig,
}

impl AnalyticsClient {
    pub fn new(client: Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    /// Whole-zone aggregates for the given zones in the given bucket.
    pub async fn fetch_zone_totals(
        &self,
        zone_ids: &[String],
        window: &TimeWindow,
    ) -> Result<AnalyticsData, QueryError> {
        self.run_query(ZONE_TOTALS_QUERY, zone_ids, window).await
    }

    /// Per-edge-location aggregates for the given zones in the given bucket.
    pub async fn fetch_colo_totals(
        &self,
        zone_ids: &[String],
        window: &TimeWindow,
    ) -> Result<AnalyticsData, QueryError> {
        self.run_query(COLO_TOTALS_QUERY, zone_ids, window).await
    }

    async fn run_query(
        &self,
        query: &'static str,
        zone_ids: &[String],
        window: &TimeWindow,
    ) -> Result<AnalyticsData, QueryError> {
        let request = GraphqlRequest {
            query,
            variables: Variables {
                zone_ids,
                time: window.start,
                limit: RESULT_LIMIT,
            },
        };

        debug!(
            zones = zone_ids.len(),
            bucket = %window.start,
            "running aggregate query"
        );

        let response = self
            .client
            .post(&self.config.analytics_api_url)
            .header("X-AUTH-EMAIL", &self.config.email)
            .header("X-AUTH-KEY", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status { status, body });
        }

        let envelope: Envelope = response.json().await?;

        if let Some(errors) = &envelope.errors {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(QueryError::Api(joined));
            }
        }

        envelope.data.ok_or(QueryError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_window() -> TimeWindow {
        TimeWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 12, 2, 0).unwrap(),
            granularity_secs: 60,
        }
    }

    fn client_for(url: &str) -> AnalyticsClient {
        let config = ApiConfig::new("ops@acme.com", "k-test").with_analytics_api_url(url);
        AnalyticsClient::new(Client::new(), config)
    }

    /// Minimal mock HTTP server built on tokio that returns one canned
    /// response and hands back the raw request it received.
    struct MockAnalyticsApi {
        listener: tokio::net::TcpListener,
        url: String,
    }

    impl MockAnalyticsApi {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let url = format!("http://127.0.0.1:{port}/graphql");
            Self { listener, url }
        }

        async fn respond_once(self, status_code: u16, body: &str) -> String {
            let body = body.to_owned();
            let (mut stream, _) = self.listener.accept().await.unwrap();

            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let mut buf = vec![0u8; 16384];
            let n = stream.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            request
        }
    }

    #[tokio::test]
    async fn fetch_zone_totals_parses_data() {
        let server = MockAnalyticsApi::start().await;
        let client = client_for(&server.url);

        let body = r#"{"data":{"viewer":{"zones":[
            {"zoneTag":"z1","httpRequests1mGroups":[]}
        ]}}}"#;
        let server_handle = tokio::spawn(async move { server.respond_once(200, body).await });

        let zone_ids = vec!["z1".to_string()];
        let data = client
            .fetch_zone_totals(&zone_ids, &test_window())
            .await
            .expect("query should succeed");

        let request = server_handle.await.unwrap();
        assert!(request.contains("X-AUTH-EMAIL") || request.contains("x-auth-email"));
        assert!(request.contains("X-AUTH-KEY") || request.contains("x-auth-key"));

        assert_eq!(data.viewer.zones.len(), 1);
        assert_eq!(data.viewer.zones[0].zone_tag, "z1");
    }

    #[tokio::test]
    async fn graphql_errors_fail_even_with_partial_data() {
        let server = MockAnalyticsApi::start().await;
        let client = client_for(&server.url);

        let body = r#"{
            "data": {"viewer":{"zones":[{"zoneTag":"z1","httpRequests1mGroups":[]}]}},
            "errors": [{"message":"zone quota exceeded"}]
        }"#;
        let server_handle = tokio::spawn(async move { server.respond_once(200, body).await });

        let zone_ids = vec!["z1".to_string()];
        let err = client
            .fetch_zone_totals(&zone_ids, &test_window())
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        match err {
            QueryError::Api(msg) => assert!(msg.contains("zone quota exceeded")),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockAnalyticsApi::start().await;
        let client = client_for(&server.url);

        let server_handle =
            tokio::spawn(async move { server.respond_once(502, "bad gateway").await });

        let zone_ids = vec!["z1".to_string()];
        let err = client
            .fetch_colo_totals(&zone_ids, &test_window())
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, QueryError::Status { status, .. }
            if status == reqwest::StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn empty_envelope_is_missing_data() {
        let server = MockAnalyticsApi::start().await;
        let client = client_for(&server.url);

        let server_handle = tokio::spawn(async move { server.respond_once(200, "{}").await });

        let zone_ids = vec!["z1".to_string()];
        let err = client
            .fetch_zone_totals(&zone_ids, &test_window())
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, QueryError::MissingData));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Nothing listens on this port.
        let client = client_for("http://127.0.0.1:1/graphql");

        let zone_ids = vec!["z1".to_string()];
        let err = client
            .fetch_zone_totals(&zone_ids, &test_window())
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Transport(_)));
    }
}
