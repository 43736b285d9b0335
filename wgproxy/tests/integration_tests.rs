//! Integration tests for wgproxy

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wgproxy::{
    proxy_api_router, Error, FailoverRouter, HostSelector, ProxyState, TrackPage,
};

/// Selector that deterministically picks the given host (empty registry list
/// forces the static fallback path, and a single-entry fallback list leaves
/// nothing to randomize).
fn fixed_selector(host: &str) -> Arc<HostSelector> {
    Arc::new(
        HostSelector::builder()
            .registry_endpoints(vec![])
            .fallback_hosts(vec![host.to_string()])
            .build()
            .unwrap(),
    )
}

fn router_with(flagships: Vec<String>, selector: Arc<HostSelector>) -> FailoverRouter {
    FailoverRouter::builder()
        .hosts(selector)
        .flagship_hosts(flagships)
        .gateway_host("")
        .build()
        .unwrap()
}

fn trending_body() -> serde_json::Value {
    json!({
        "data": [
            {
                "id": "tr1",
                "title": "First",
                "user": { "id": "u1", "name": "Artist One" },
                "artwork": { "480x480": "https://img/1.jpg" },
                "track_cid": "QmAAA"
            },
            {
                "id": "tr2",
                "title": "Second",
                "user": { "id": "u2", "name": "Artist Two" }
            }
        ]
    })
}

#[tokio::test]
async fn trending_tries_hosts_in_order_and_stops_at_first_success() {
    let host_a = MockServer::start().await;
    let host_b = MockServer::start().await;
    let host_c = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tracks/trending"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&host_a)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/trending"))
        .and(query_param("limit", "20"))
        .and(query_param("app_name", "audius-player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(trending_body()))
        .expect(1)
        .mount(&host_b)
        .await;
    // C is lower priority than the first success and must never be called
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&host_c)
        .await;

    let router = router_with(
        vec![host_a.uri(), host_b.uri(), host_c.uri()],
        fixed_selector(&host_a.uri()),
    );

    let body = router.trending(None).await.unwrap();
    assert_eq!(body, trending_body());
}

#[tokio::test]
async fn trending_exhaustion_reports_last_host_error() {
    let host_a = MockServer::start().await;
    let host_b = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&host_a)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&host_b)
        .await;

    let router = router_with(
        vec![host_a.uri(), host_b.uri()],
        fixed_selector(&host_a.uri()),
    );

    let err = router.trending(Some(5)).await.unwrap_err();
    match err {
        Error::TrendingUnavailable { last_error } => {
            // Last candidate was B, which answered 503
            assert!(last_error.contains(&host_b.uri()), "got: {last_error}");
            assert!(last_error.contains("503"), "got: {last_error}");
        }
        other => panic!("expected TrendingUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn trending_uses_the_configured_default_limit() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/trending"))
        .and(query_param("limit", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&host)
        .await;

    let router = FailoverRouter::builder()
        .hosts(fixed_selector(&host.uri()))
        .flagship_hosts(vec![host.uri()])
        .gateway_host("")
        .default_limit(7)
        .build()
        .unwrap();
    router.trending(None).await.unwrap();
}

#[tokio::test]
async fn trending_limit_is_capped() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/trending"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&host)
        .await;

    let router = router_with(vec![host.uri()], fixed_selector(&host.uri()));
    router.trending(Some(5000)).await.unwrap();
}

#[tokio::test]
async fn empty_search_query_fails_fast_with_zero_network_calls() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&gateway)
        .await;

    let router = FailoverRouter::builder()
        .hosts(fixed_selector(&gateway.uri()))
        .gateway_host(gateway.uri())
        .build()
        .unwrap();

    assert!(matches!(router.search("").await, Err(Error::MissingQuery)));
    assert!(matches!(
        router.search("   ").await,
        Err(Error::MissingQuery)
    ));
}

#[tokio::test]
async fn search_falls_back_from_gateway_to_selected_host() {
    let gateway = MockServer::start().await;
    let selected = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tracks/search"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/search"))
        .and(query_param("query", "miles davis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(trending_body()))
        .expect(1)
        .mount(&selected)
        .await;

    let router = FailoverRouter::builder()
        .hosts(fixed_selector(&selected.uri()))
        .gateway_host(gateway.uri())
        .build()
        .unwrap();

    let body = router.search("miles davis").await.unwrap();
    let page = TrackPage::from_value(body).unwrap();
    assert_eq!(page.data.len(), 2);
    // Only the first entry carries a content identifier
    assert_eq!(page.streamable().len(), 1);
}

#[tokio::test]
async fn search_exhaustion_is_a_service_unavailable_without_detail() {
    let gateway = MockServer::start().await;
    let selected = MockServer::start().await;
    for server in [&gateway, &selected] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    let router = FailoverRouter::builder()
        .hosts(fixed_selector(&selected.uri()))
        .gateway_host(gateway.uri())
        .build()
        .unwrap();

    assert!(matches!(
        router.search("anything").await,
        Err(Error::SearchUnavailable)
    ));
}

#[tokio::test]
async fn stream_relays_exact_bytes_and_content_type() {
    let host_a = MockServer::start().await;
    let host_b = MockServer::start().await;

    let audio: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    Mock::given(method("GET"))
        .and(path("/v1/tracks/tr1/stream"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&host_a)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/tr1/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(audio.clone(), "audio/ogg"))
        .expect(1)
        .mount(&host_b)
        .await;

    let router = router_with(
        vec![host_a.uri(), host_b.uri()],
        fixed_selector(&host_a.uri()),
    );

    let payload = router.stream("/tracks/tr1/stream").await.unwrap();
    assert_eq!(payload.content_type, "audio/ogg");
    assert_eq!(payload.body.as_ref(), audio.as_slice());
}

#[tokio::test]
async fn stream_exhaustion_reports_last_host_error() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&host)
        .await;

    let router = router_with(vec![host.uri()], fixed_selector(&host.uri()));
    let err = router.stream("/tracks/missing/stream").await.unwrap_err();
    match err {
        Error::StreamUnavailable { last_error } => {
            assert!(last_error.contains("404"), "got: {last_error}");
        }
        other => panic!("expected StreamUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn passthrough_relays_upstream_status_verbatim() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1/tracks"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&host)
        .await;

    let router = router_with(vec![], fixed_selector(&host.uri()));
    let err = router.passthrough("/users/u1/tracks", &[]).await.unwrap_err();
    match err {
        Error::UpstreamStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such user");
        }
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn passthrough_unparseable_success_body_is_a_distinct_error() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&host)
        .await;

    let router = router_with(vec![], fixed_selector(&host.uri()));
    let err = router.passthrough("/users/u1/tracks", &[]).await.unwrap_err();
    match err {
        Error::InvalidPayload { body } => assert!(body.contains("oops")),
        other => panic!("expected InvalidPayload, got {other:?}"),
    }
}

#[tokio::test]
async fn host_selector_picks_from_registry_list() {
    let registry = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": ["https://node-a.example"]})),
        )
        .mount(&registry)
        .await;

    let selector = HostSelector::builder()
        .registry_endpoints(vec![registry.uri()])
        .build()
        .unwrap();

    assert_eq!(selector.select().await.unwrap(), "https://node-a.example");
}

#[tokio::test]
async fn host_selector_skips_failing_registries() {
    let bad = MockServer::start().await;
    let good = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&bad)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": ["https://node-b.example"]})),
        )
        .expect(1)
        .mount(&good)
        .await;

    let selector = HostSelector::builder()
        .registry_endpoints(vec![bad.uri(), good.uri()])
        .build()
        .unwrap();

    assert_eq!(selector.select().await.unwrap(), "https://node-b.example");
}

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

async fn call(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

fn test_app(router: FailoverRouter) -> axum::Router {
    proxy_api_router(ProxyState::new(Arc::new(router)))
}

#[tokio::test]
async fn api_missing_endpoint_is_bad_request_with_cors() {
    let host = MockServer::start().await;
    let app = test_app(router_with(vec![host.uri()], fixed_selector(&host.uri())));

    let (status, headers, body) = call(app, "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Missing endpoint parameter");
}

#[tokio::test]
async fn api_missing_search_query_is_bad_request() {
    let host = MockServer::start().await;
    let app = test_app(router_with(vec![host.uri()], fixed_selector(&host.uri())));

    let (status, _headers, body) = call(app, "/?endpoint=/tracks/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Search query required");
}

#[tokio::test]
async fn api_trending_returns_upstream_json_with_cors() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(trending_body()))
        .mount(&host)
        .await;

    let app = test_app(router_with(vec![host.uri()], fixed_selector(&host.uri())));
    let (status, headers, body) = call(app, "/?endpoint=/trending&limit=20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, trending_body());
}

#[tokio::test]
async fn api_preflight_answers_with_cors_headers() {
    let host = MockServer::start().await;
    let app = test_app(router_with(vec![host.uri()], fixed_selector(&host.uri())));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, OPTIONS"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
}

#[tokio::test]
async fn api_unexpected_failure_is_500_and_clears_the_host_cache() {
    // A live host populates the cache, then goes away so the next request
    // fails at the transport level instead of with an upstream status.
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&host)
        .await;

    let selector = fixed_selector(&host.uri());
    let router = router_with(vec![], Arc::clone(&selector));
    let app = test_app(router);

    let (status, _headers, _body) = call(app.clone(), "/?endpoint=/users/u1/tracks").await;
    assert_eq!(status, StatusCode::OK);
    assert!(selector.selected().await.is_some());

    drop(host);

    let (status, headers, body) = call(app, "/?endpoint=/users/u1/tracks").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("HTTP request failed"));
    // The cached host is treated as suspect and dropped
    assert!(selector.selected().await.is_none());
}

#[tokio::test]
async fn api_exhaustion_is_service_unavailable_with_details() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&host)
        .await;

    let app = test_app(router_with(vec![host.uri()], fixed_selector(&host.uri())));
    let (status, _headers, body) = call(app, "/?endpoint=/trending").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Trending unavailable from all hosts");
    assert!(body["details"].as_str().unwrap().contains("500"));
}
