//! Integration tests for the proxy-facing stream client

use serde_json::json;
use wgplayer::{HttpStreamApi, StreamApi};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page() -> serde_json::Value {
    json!({
        "data": [
            {
                "id": "tr1",
                "title": "Streamable",
                "user": { "id": "u1", "name": "Artist One" },
                "track_cid": "QmAAA"
            },
            {
                "id": "tr2",
                "title": "Metadata only",
                "user": { "id": "u2", "name": "Artist Two" }
            },
            {
                "id": 12345,
                "title": "Numeric id",
                "user": { "id": "u3", "name": "Artist Three" },
                "preview_cid": "QmBBB"
            }
        ]
    })
}

fn api(server: &MockServer) -> HttpStreamApi {
    HttpStreamApi::builder()
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn trending_returns_only_streamable_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "/trending"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page()))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = api(&server).trending(None).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "tr1");
    // Numeric ids are normalized to strings
    assert_eq!(tracks[1].id, "12345");
}

#[tokio::test]
async fn search_escapes_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "/tracks/search"))
        .and(query_param("q", "miles davis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page()))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = api(&server).search("miles davis").await.unwrap();
    assert_eq!(tracks.len(), 2);
}

#[tokio::test]
async fn artist_tracks_hit_the_users_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "/users/u1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page()))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = api(&server).artist_tracks("u1").await.unwrap();
    assert_eq!(tracks.len(), 2);
}

#[tokio::test]
async fn proxy_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Trending unavailable from all hosts"
        })))
        .mount(&server)
        .await;

    let err = api(&server).trending(None).await.unwrap_err();
    assert!(err.to_string().contains("503"));
}
