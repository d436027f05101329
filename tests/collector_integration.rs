//! Integration tests for the collection cycle
//!
//! These spin up a mock upstream (zone directory + analytics endpoint) on an
//! ephemeral port and drive a full cycle through the public API.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use edgescope::collector::Collector;
use edgescope::config::ApiConfig;
use edgescope::models::{Dimension, Metric};
use edgescope::query::AnalyticsClient;
use edgescope::zones::ZoneDirectory;

/// Canned upstream payloads: the zone-directory envelope plus one response
/// per analytics query family.
#[derive(Clone)]
struct Upstream {
    zone_listing: Value,
    zone_totals: Value,
    colo_totals: Value,
}

async fn zone_listing(State(upstream): State<Arc<Upstream>>) -> Json<Value> {
    Json(upstream.zone_listing.clone())
}

async fn graphql(
    State(upstream): State<Arc<Upstream>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default();
    assert_eq!(body["variables"]["limit"], json!(9999));
    assert!(body["variables"]["zoneIDs"].is_array());
    assert!(body["variables"]["time"].is_string());

    // The grouping family requested tells the two queries apart.
    if query.contains("httpRequests1mByColoGroups") {
        Json(upstream.colo_totals.clone())
    } else {
        Json(upstream.zone_totals.clone())
    }
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/client/v4/zones", get(zone_listing))
        .route("/client/v4/graphql/", post(graphql))
        .with_state(Arc::new(upstream));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn collector_for(base_url: &str) -> Collector {
    let config = ApiConfig::new("ops@acme.com", "k-test")
        .with_zone_api_url(format!("{base_url}/client/v4"))
        .with_analytics_api_url(format!("{base_url}/client/v4/graphql/"));

    let http = reqwest::Client::new();
    let directory = ZoneDirectory::new(http.clone(), config.clone(), Duration::from_secs(300));
    let analytics = AnalyticsClient::new(http, config);
    Collector::new(directory, analytics)
}

fn two_zone_listing() -> Value {
    json!({
        "success": true,
        "errors": [],
        "result": [
            { "id": "z1", "name": "acme.com" },
            { "id": "z2", "name": "beta.io" }
        ]
    })
}

#[tokio::test]
async fn full_cycle_produces_records_for_both_query_families() {
    let base_url = spawn_upstream(Upstream {
        zone_listing: two_zone_listing(),
        zone_totals: json!({
            "data": { "viewer": { "zones": [{
                "zoneTag": "z1",
                "httpRequests1mGroups": [{
                    "dimensions": { "datetime": "2024-03-01T12:02:00Z" },
                    "uniq": { "uniques": 42 },
                    "sum": {
                        "requests": 150,
                        "bytes": 9000,
                        "countryMap": [
                            { "clientCountryName": "US", "bytes": 6000, "requests": 100, "threats": 1 },
                            { "clientCountryName": "DE", "bytes": 3000, "requests": 50, "threats": 0 }
                        ]
                    }
                }]
            }] } }
        }),
        colo_totals: json!({
            "data": { "viewer": { "zones": [
                {
                    "zoneTag": "z1",
                    "httpRequests1mByColoGroups": [{
                        "dimensions": { "datetime": "2024-03-01T12:02:00Z", "coloCode": "LAX" },
                        "sum": { "requests": 90, "bytes": 5000 }
                    }]
                },
                {
                    "zoneTag": "z2",
                    "httpRequests1mByColoGroups": [{
                        "dimensions": { "datetime": "2024-03-01T12:02:00Z", "coloCode": "FRA" },
                        "sum": { "requests": 30, "bytes": 2000 }
                    }]
                }
            ] } }
        }),
    })
    .await;

    let records = collector_for(&base_url)
        .collect()
        .await
        .expect("cycle should succeed");

    // Whole-zone family: no colo code attached.
    let country_requests: Vec<_> = records
        .iter()
        .filter(|r| r.dimension == Dimension::Country && r.metric == Metric::Requests)
        .collect();
    assert_eq!(country_requests.len(), 2);
    assert!(country_requests.iter().all(|r| r.colo_code.is_none()));
    assert!(country_requests.iter().all(|r| r.zone_name == "acme.com"));

    let uniques: Vec<_> = records
        .iter()
        .filter(|r| r.metric == Metric::Uniques)
        .collect();
    assert_eq!(uniques.len(), 1);
    assert_eq!(uniques[0].value, 42);
    assert_eq!(uniques[0].dimension, Dimension::Scalar);

    // Per-location family: colo code attached, zone names resolved per zone.
    let lax: Vec<_> = records
        .iter()
        .filter(|r| r.colo_code.as_deref() == Some("LAX"))
        .collect();
    assert!(!lax.is_empty());
    assert!(lax.iter().all(|r| r.zone_id == "z1" && r.zone_name == "acme.com"));

    let fra: Vec<_> = records
        .iter()
        .filter(|r| r.colo_code.as_deref() == Some("FRA"))
        .collect();
    assert!(!fra.is_empty());
    assert!(fra.iter().all(|r| r.zone_id == "z2" && r.zone_name == "beta.io"));
}

#[tokio::test]
async fn cycle_fails_closed_when_one_query_reports_errors() {
    let base_url = spawn_upstream(Upstream {
        zone_listing: two_zone_listing(),
        zone_totals: json!({
            "data": { "viewer": { "zones": [{
                "zoneTag": "z1",
                "httpRequests1mGroups": [{
                    "dimensions": { "datetime": "2024-03-01T12:02:00Z" },
                    "uniq": { "uniques": 1 },
                    "sum": { "requests": 10 }
                }]
            }] } }
        }),
        // Partial data next to errors must still fail the cycle.
        colo_totals: json!({
            "data": { "viewer": { "zones": [] } },
            "errors": [ { "message": "internal server error" } ]
        }),
    })
    .await;

    let err = collector_for(&base_url).collect().await.unwrap_err();
    assert!(err.to_string().contains("internal server error"));
}

#[tokio::test]
async fn cycle_fails_when_the_directory_rejects_credentials() {
    let base_url = spawn_upstream(Upstream {
        zone_listing: json!({
            "success": false,
            "errors": [ { "code": 9103, "message": "Unknown X-Auth-Key or X-Auth-Email" } ],
            "result": []
        }),
        zone_totals: json!({}),
        colo_totals: json!({}),
    })
    .await;

    let err = collector_for(&base_url).collect().await.unwrap_err();
    assert!(err.to_string().contains("Unknown X-Auth-Key"));
}

#[tokio::test]
async fn empty_zone_set_short_circuits_to_no_records() {
    let base_url = spawn_upstream(Upstream {
        zone_listing: json!({ "success": true, "errors": [], "result": [] }),
        // Would fail decoding if the collector queried analytics anyway.
        zone_totals: json!("not an envelope"),
        colo_totals: json!("not an envelope"),
    })
    .await;

    let records = collector_for(&base_url)
        .collect()
        .await
        .expect("empty zone set is not an error");
    assert!(records.is_empty());
}
