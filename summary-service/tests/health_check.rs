mod common;

use common::TestApp;
use std::sync::Arc;
use summary_service::services::{MemoryStorage, PostgrestStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Medora Clinical Summary API");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn readiness_fails_when_datastore_is_down() {
    let datastore = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinical_summaries"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&datastore)
        .await;

    let store = Arc::new(PostgrestStore::new(
        &datastore.uri(),
        "clinical_summaries",
        secrecy::Secret::new("service-key".to_string()),
    ));
    let port = common::launch(store, Arc::new(MemoryStorage::new("clinical-notes"))).await;

    let response = reqwest::get(format!("http://127.0.0.1:{}/ready", port))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn metrics_are_plain_text() {
    let app = TestApp::spawn().await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}
