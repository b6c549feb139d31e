mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{summary, TestApp};
use http_body_util::BodyExt;
use std::sync::Arc;
use summary_service::config::SummaryConfig;
use summary_service::services::{MemoryStorage, MemoryStore};
use summary_service::startup::{build_router, AppState};
use tower::ServiceExt;

fn ids(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .expect("list body is an array")
        .iter()
        .map(|item| item["summary_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn by_patient_returns_newest_first() {
    let app = TestApp::spawn().await;
    let base = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
    app.seed(summary("older", "patient-1", base));
    app.seed(summary("newest", "patient-1", base + Duration::hours(5)));
    app.seed(summary("middle", "patient-1", base + Duration::hours(2)));
    app.seed(summary("other", "patient-2", base + Duration::hours(9)));

    let response = app.get("/summaries/by-patient/patient-1").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ids(&body), vec!["newest", "middle", "older"]);

    let first = &body[0];
    assert_eq!(first["patient_name"], "Ada Lovelace");
    assert_eq!(first["affected_organ"], "Heart");
    assert_eq!(first["created_at"], "2024-03-10T13:00:00Z");
    // Projection only.
    assert!(first.get("patient_id").is_none());
    assert!(first.get("diagnoses").is_none());
}

#[tokio::test]
async fn by_patient_without_records_is_empty() {
    let app = TestApp::spawn().await;

    let response = app.get("/summaries/by-patient/nobody").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn by_date_covers_the_whole_utc_day() {
    let app = TestApp::spawn().await;
    let day = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    app.seed(summary("before", "p", day - Duration::microseconds(1)));
    app.seed(summary("midnight", "p", day));
    app.seed(summary("noon", "p", day + Duration::hours(12)));
    app.seed(summary(
        "last",
        "p",
        day + Duration::days(1) - Duration::microseconds(1),
    ));
    app.seed(summary("after", "p", day + Duration::days(1)));

    let response = app.get("/summaries/by-date?date=2024-01-15").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ids(&body), vec!["last", "noon", "midnight"]);
}

#[tokio::test]
async fn by_date_rejects_malformed_dates() {
    let app = TestApp::spawn().await;

    for date in ["2024-02-30", "15-01-2024", "2024-1-5", "yesterday"] {
        let response = app.get(&format!("/summaries/by-date?date={}", date)).await;

        assert_eq!(response.status().as_u16(), 400, "date {:?}", date);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD");
    }
}

#[tokio::test]
async fn all_respects_limit_and_order() {
    let app = TestApp::spawn().await;
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    for i in 0..5 {
        app.seed(summary(&format!("s{}", i), "p", base + Duration::minutes(i)));
    }

    let response = app.get("/summaries/all?limit=2").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ids(&body), vec!["s4", "s3"]);

    let response = app.get("/summaries/all?limit=1").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ids(&body), vec!["s4"]);

    let response = app.get("/summaries/all").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ids(&body), vec!["s4", "s3", "s2", "s1", "s0"]);
}

#[tokio::test]
async fn limit_of_one_on_empty_store_is_empty() {
    let app = TestApp::spawn().await;

    let response = app.get("/summaries/all?limit=1").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

async fn assert_json_error(response: reqwest::Response) -> String {
    assert_eq!(response.status().as_u16(), 400);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/json"),
        "unexpected content type {}",
        content_type
    );
    let body: serde_json::Value = response.json().await.expect("error body is JSON");
    body["error"]
        .as_str()
        .expect("error message is a string")
        .to_string()
}

#[tokio::test]
async fn non_numeric_limit_is_a_json_error() {
    let app = TestApp::spawn().await;

    let message = assert_json_error(app.get("/summaries/all?limit=abc").await).await;

    assert!(message.contains("query string"), "{}", message);
}

#[tokio::test]
async fn missing_date_is_a_json_error() {
    let app = TestApp::spawn().await;

    let message = assert_json_error(app.get("/summaries/by-date").await).await;

    assert!(message.contains("date"), "{}", message);
}

#[tokio::test]
async fn out_of_range_limit_is_a_json_error() {
    let app = TestApp::spawn().await;

    let response = app.get("/summaries/all?limit=0").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("limit must be between 1 and 1000"));
}

#[tokio::test]
async fn all_rejects_out_of_range_limits() {
    let app = TestApp::spawn().await;

    for limit in ["0", "1001", "-5"] {
        let response = app.get(&format!("/summaries/all?limit={}", limit)).await;
        assert_eq!(response.status().as_u16(), 400, "limit {}", limit);
    }

    let response = app.get("/summaries/all?limit=1000").await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_summary_is_404_naming_the_id() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/summaries/8a1c6f2e-4b7d-4e0a-9a51-0d3c2b1e9f77")
        .await;

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Summary with ID 8a1c6f2e-4b7d-4e0a-9a51-0d3c2b1e9f77 not found"
    );
}

#[tokio::test]
async fn seeded_summary_is_returned_in_full() {
    let app = TestApp::spawn().await;
    let created_at = Utc.with_ymd_and_hms(2024, 7, 4, 9, 30, 0).unwrap();
    app.seed(summary("full-record", "patient-42", created_at));

    let response = app.get("/summaries/full-record").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["patient_id"], "patient-42");
    assert_eq!(body["diagnoses"], serde_json::json!(["Hypertension"]));
    assert_eq!(body["affected_system"], "Cardiovascular");
    assert_eq!(body["raw_notes_type"], "none");
    assert_eq!(body["created_at"], "2024-07-04T09:30:00Z");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let state = AppState::new(
        SummaryConfig::in_memory(0),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStorage::new("clinical-notes")),
    );
    let router = build_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/summaries/all")
                .header("x-request-id", "req-123")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"[]");
}
