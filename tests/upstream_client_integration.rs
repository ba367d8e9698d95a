// Integration tests for `PlausibleClient` using wiremock.

use std::time::Duration;

use pagestats::upstream::{
    AggregateRequest, BreakdownRequest, PlausibleClient, StatsProvider, UpstreamError,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(client: reqwest::Client) -> (MockServer, PlausibleClient) {
    let server = MockServer::start().await;
    let plausible = PlausibleClient::from_reqwest(
        &format!("{}/api/v1/stats/", server.uri()),
        SecretString::from("secret-token".to_string()),
        client,
    )
    .unwrap();
    (server, plausible)
}

async fn setup() -> (MockServer, PlausibleClient) {
    setup_with(reqwest::Client::new()).await
}

fn aggregate_request() -> AggregateRequest {
    AggregateRequest {
        site_id: "example.com".into(),
        date: "2024-05-01,2024-05-14".into(),
        metrics: "pageviews,time_on_page".into(),
        filters: "event:page==/blog/".into(),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_aggregate_sends_bearer_and_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/aggregate"))
        .and(header("authorization", "Bearer secret-token"))
        .and(query_param("site_id", "example.com"))
        .and(query_param("period", "custom"))
        .and(query_param("date", "2024-05-01,2024-05-14"))
        .and(query_param("metrics", "pageviews,time_on_page"))
        .and(query_param("filters", "event:page==/blog/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "pageviews": {"value": 77},
                "time_on_page": {"value": 48.2}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client.aggregate(&aggregate_request()).await.unwrap();

    assert_eq!(results.pageviews(), 77);
    assert_eq!(results.time_on_page(), 48.2);
}

#[tokio::test]
async fn test_aggregate_null_metric_defaults_to_zero() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"time_on_page": {"value": null}}
        })))
        .mount(&server)
        .await;

    let results = client.aggregate(&aggregate_request()).await.unwrap();

    assert_eq!(results.time_on_page(), 0.0);
    assert_eq!(results.pageviews(), 0);
}

#[tokio::test]
async fn test_breakdown_percent_encodes_filter_values() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/breakdown"))
        .and(query_param("property", "visit:source"))
        .and(query_param("filters", "event:page==/a b?c=1&d"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"source": "Google", "visitors": 3},
                {"source": "Bing", "visitors": 1}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client
        .breakdown(&BreakdownRequest {
            site_id: "example.com".into(),
            date: "2024-05-01,2024-05-14".into(),
            property: "visit:source".into(),
            metrics: "visitors".into(),
            filters: "event:page==/a b?c=1&d".into(),
            limit: 5,
        })
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source"], "Google");
    assert_eq!(rows[1]["source"], "Bing");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_status_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/aggregate"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"Invalid API key"}"#),
        )
        .mount(&server)
        .await;

    let err = client.aggregate(&aggregate_request()).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Status { status: 401, .. }));
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.body(), Some(r#"{"error":"Invalid API key"}"#));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.aggregate(&aggregate_request()).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Decode { .. }));
    assert_eq!(err.body(), Some("<html>oops</html>"));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let (server, client) = setup_with(http).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stats/aggregate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": {}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.aggregate(&aggregate_request()).await.unwrap_err();

    assert!(err.is_timeout());
}
