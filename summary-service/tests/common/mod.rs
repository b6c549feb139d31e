#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use summary_service::config::SummaryConfig;
use summary_service::models::{ClinicalSummary, NewSummary, RawNotesType};
use summary_service::services::{MemoryStorage, MemoryStore, ObjectStorage, SummaryStore};
use summary_service::startup::{AppState, Application};

pub const TEST_BUCKET: &str = "clinical-notes";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_storage(MemoryStorage::new(TEST_BUCKET)).await
    }

    pub async fn spawn_with_storage(storage: MemoryStorage) -> Self {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(storage);

        let port = launch(store.clone(), storage.clone()).await;

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::new(),
            store,
            storage,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn seed(&self, summary: ClinicalSummary) {
        self.store.seed(summary).expect("Failed to seed summary");
    }

    pub async fn post_summary(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(self.url("/summaries"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Serves an app over the given backends and returns its port once `/health`
/// answers.
pub async fn launch(store: Arc<dyn SummaryStore>, storage: Arc<dyn ObjectStorage>) -> u16 {
    let state = AppState::new(SummaryConfig::in_memory(0), store, storage);
    let app = Application::with_state(state)
        .await
        .expect("Failed to build test application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let client = reqwest::Client::new();
    let health_url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    port
}

/// Form with the three required fields filled in.
pub fn base_form(patient_id: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("patient_id", patient_id.to_string())
        .text("patient_name", "Ada Lovelace")
        .text("summary_text", "Stable after observation")
}

pub fn pdf_part(file_name: &str, data: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str("application/pdf")
        .expect("valid mime type")
}

pub fn summary(id: &str, patient_id: &str, created_at: DateTime<Utc>) -> ClinicalSummary {
    NewSummary {
        patient_id: patient_id.to_string(),
        patient_name: "Ada Lovelace".to_string(),
        summary_text: format!("Summary {}", id),
        diagnoses: vec!["Hypertension".to_string()],
        affected_system: Some("Cardiovascular".to_string()),
        affected_organ: Some("Heart".to_string()),
        animation_asset: None,
        raw_notes_type: RawNotesType::None,
        raw_notes_text: None,
        raw_notes_file_url: None,
    }
    .into_summary(id.to_string(), created_at)
}
