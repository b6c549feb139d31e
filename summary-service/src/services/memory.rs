//! In-process backends for local runs and tests.

use super::datastore::{SummaryQuery, SummaryStore};
use super::storage::ObjectStorage;
use crate::models::{ClinicalSummary, NewSummary, SummaryListItem};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("in-memory backend lock poisoned")))
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<ClinicalSummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record as-is, keeping its id and timestamp.
    pub fn seed(&self, summary: ClinicalSummary) -> Result<(), AppError> {
        lock(&self.rows)?.push(summary);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, query: &SummaryQuery) -> Result<Vec<ClinicalSummary>, AppError> {
        let rows = lock(&self.rows)?;
        let mut matched: Vec<ClinicalSummary> =
            rows.iter().filter(|r| query.matches(r)).cloned().collect();
        if query.newest_first {
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn insert(&self, row: &NewSummary) -> Result<Vec<ClinicalSummary>, AppError> {
        let summary = row
            .clone()
            .into_summary(Uuid::new_v4().to_string(), Utc::now());
        lock(&self.rows)?.push(summary.clone());
        Ok(vec![summary])
    }

    async fn select(&self, query: &SummaryQuery) -> Result<Vec<SummaryListItem>, AppError> {
        Ok(self
            .matching(query)?
            .iter()
            .map(SummaryListItem::from)
            .collect())
    }

    async fn single(&self, query: &SummaryQuery) -> Result<Option<ClinicalSummary>, AppError> {
        Ok(self.matching(query)?.into_iter().next())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        lock(&self.rows).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

pub struct MemoryStorage {
    bucket: String,
    available: bool,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            available: true,
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Storage whose uploads always fail.
    pub fn unavailable(bucket: &str) -> Self {
        Self {
            available: false,
            ..Self::new(bucket)
        }
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        if !self.available {
            return Err(AppError::upstream(format!(
                "Failed to upload PDF: bucket {} is unavailable",
                self.bucket
            )));
        }

        lock(&self.objects)?.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        tracing::info!(bucket = %self.bucket, key = %key, "[MEMORY] Stored object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String, AppError> {
        Ok(format!("memory://{}/{}", self.bucket, key))
    }
}
