//! MOCK mode and diagnostic endpoint tests.

use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_generate_serves_exact_mock_bytes() {
    let assets = tempfile::tempdir().unwrap();
    let png = common::fake_png(1234);
    std::fs::create_dir_all(assets.path().join("mock-samples")).unwrap();
    std::fs::write(assets.path().join("mock-samples/sample1.png"), &png).unwrap();

    let relay = common::start_relay(common::mock_config(assets.path(), "mock-samples/sample1.png")).await;
    let client = common::http_client();

    let res = client.post(relay.url("/api/generate")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["content-length"], "1234");
    assert_eq!(res.bytes().await.unwrap().to_vec(), png);
}

#[tokio::test]
async fn test_generate_ignores_uploads_in_mock_mode() {
    let assets = tempfile::tempdir().unwrap();
    let png = common::fake_png(64);
    std::fs::write(assets.path().join("sample.png"), &png).unwrap();

    let relay = common::start_relay(common::mock_config(assets.path(), "sample.png")).await;
    let client = common::http_client();

    let form = common::upload_form(&[("person", "me.png", b"person"), ("cloth", "shirt.png", b"cloth")]);
    let res = client.post(relay.url("/api/generate")).multipart(form).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().to_vec(), png);
    assert_eq!(relay.upload_count(), 0, "MOCK mode must not store uploads");
}

#[tokio::test]
async fn test_missing_mock_image_is_server_error() {
    let assets = tempfile::tempdir().unwrap();
    let relay = common::start_relay(common::mock_config(assets.path(), "absent.png")).await;
    let client = common::http_client();

    let res = client.post(relay.url("/api/generate")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Mock image not found");
}

#[tokio::test]
async fn test_mock_image_endpoint() {
    let assets = tempfile::tempdir().unwrap();
    let png = common::fake_png(300);
    std::fs::write(assets.path().join("sample.png"), &png).unwrap();

    let relay = common::start_relay(common::mock_config(assets.path(), "sample.png")).await;
    let client = common::http_client();

    let res = client.get(relay.url("/mock-image")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().to_vec(), png);
}

#[tokio::test]
async fn test_mock_image_endpoint_not_found() {
    let assets = tempfile::tempdir().unwrap();
    let relay = common::start_relay(common::mock_config(assets.path(), "absent.png")).await;
    let client = common::http_client();

    let res = client.get(relay.url("/mock-image")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": false, "error": "Mock image not found" }));
}

#[tokio::test]
async fn test_healthz_reports_mode() {
    let assets = tempfile::tempdir().unwrap();
    let relay = common::start_relay(common::mock_config(assets.path(), "sample.png")).await;
    let client = common::http_client();

    let body: Value = client.get(relay.url("/healthz")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true, "mode": "MOCK" }));

    let live = common::start_relay(common::live_config(None)).await;
    let body: Value = client.get(live.url("/healthz")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true, "mode": "LIVE" }));
}

#[tokio::test]
async fn test_cors_and_request_id_headers() {
    let assets = tempfile::tempdir().unwrap();
    let relay = common::start_relay(common::mock_config(assets.path(), "sample.png")).await;
    let client = common::http_client();

    let res = client
        .get(relay.url("/healthz"))
        .header("origin", "https://shop.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.headers().contains_key("x-request-id"));

    let res = client
        .get(relay.url("/healthz"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}
