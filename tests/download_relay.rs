//! Download relay behaviour against a simulated remote host.

use axum::http::StatusCode;
use image_relay::config::schema::BROWSER_USER_AGENT;
use image_relay::http::ErrorBody;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_rejects_unsupported_schemes() {
    let upstream = MockServer::start().await;
    let relay = common::start_relay(&upstream).await;
    let client = common::client();

    for url in ["ftp://example.com/a.png", "file:///etc/passwd", "example.com/a.png", "javascript:alert(1)"] {
        let res = client
            .post(relay.url("/download"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{url}");

        let body: ErrorBody = res.json().await.unwrap();
        assert_eq!(body.error, "Invalid URL");
        assert_eq!(body.message, "URL must start with http://, https://, or blob:");
    }
}

#[tokio::test]
async fn test_missing_or_malformed_body() {
    let upstream = MockServer::start().await;
    let relay = common::start_relay(&upstream).await;
    let client = common::client();

    let res = client
        .post(relay.url("/download"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "URL is required");

    let res = client.post(relay.url("/download")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(relay.url("/download"))
        .header("content-type", "application/json")
        .body("{\"url\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Invalid request body");
}

#[tokio::test]
async fn test_forwards_content_type_and_bytes() {
    let upstream = MockServer::start().await;
    let image = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    Mock::given(method("GET"))
        .and(path("/photos/cat.jpg"))
        .and(header("accept", "image/*"))
        .and(header("user-agent", BROWSER_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_raw(image.clone(), "image/jpeg"))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = common::start_relay(&upstream).await;
    let res = common::client()
        .post(relay.url("/download"))
        .json(&serde_json::json!({ "url": format!("{}/photos/cat.jpg", upstream.uri()) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers["content-type"], "image/jpeg");
    assert_eq!(headers["content-disposition"], "attachment; filename=upscaled_image.png");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["cache-control"], "no-cache");
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(res.bytes().await.unwrap().to_vec(), image);
}

#[tokio::test]
async fn test_mirrors_upstream_error_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let relay = common::start_relay(&upstream).await;
    let res = common::client()
        .post(relay.url("/download"))
        .json(&serde_json::json!({ "url": format!("{}/gone.png", upstream.uri()) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Failed to download image");
    assert_eq!(body.message, "Server responded with status: 404");
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let upstream = MockServer::start().await;
    let relay = common::start_relay(&upstream).await;

    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let res = common::client()
        .post(relay.url("/download"))
        .json(&serde_json::json!({ "url": format!("http://{}/a.png", closed_addr) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.message, "No response from server");
}

#[tokio::test]
async fn test_blob_url_is_a_local_fault() {
    let upstream = MockServer::start().await;
    let relay = common::start_relay(&upstream).await;

    let res = common::client()
        .post(relay.url("/download"))
        .json(&serde_json::json!({ "url": "blob:https://example.com/550e8400" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Failed to download image");
    assert_ne!(body.message, "No response from server");
}

#[tokio::test]
async fn test_method_handling() {
    let upstream = MockServer::start().await;
    let relay = common::start_relay(&upstream).await;
    let client = common::client();

    let res = client.get(relay.url("/download")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Method not allowed");

    let res = client
        .request(reqwest::Method::OPTIONS, relay.url("/download"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let res = client.get(relay.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
