use super::datastore::{Filter, SummaryQuery, SummaryStore};
use super::storage::ObjectStorage;
use crate::models::{ClinicalSummary, NewSummary, SummaryListItem};
use crate::validation::{utc_day_bounds, UploadedFile, ValidatedSummary};
use metrics::counter;
use service_core::error::AppError;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// The summary operations, over whichever datastore and object storage the
/// application was built with.
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn SummaryStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn SummaryStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    pub async fn create(&self, summary: ValidatedSummary) -> Result<ClinicalSummary, AppError> {
        let raw_notes_file_url = match summary.raw_notes_file {
            Some(file) => Some(self.upload_notes(&summary.patient_id, file).await?),
            None => None,
        };

        let row = NewSummary {
            patient_id: summary.patient_id,
            patient_name: summary.patient_name,
            summary_text: summary.summary_text,
            diagnoses: summary.diagnoses,
            affected_system: summary.affected_system,
            affected_organ: summary.affected_organ,
            animation_asset: summary.animation_asset,
            raw_notes_type: summary.raw_notes_type,
            raw_notes_text: summary.raw_notes_text,
            raw_notes_file_url,
        };

        let created = self
            .store
            .insert(&row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                tracing::error!(patient_id = %row.patient_id, "Insert returned no rows");
                AppError::upstream("Failed to create summary in database")
            })?;

        counter!("summaries_created_total", "raw_notes_type" => created.raw_notes_type.as_str())
            .increment(1);

        tracing::info!(
            summary_id = %created.summary_id,
            patient_id = %created.patient_id,
            raw_notes_type = created.raw_notes_type.as_str(),
            "Summary created"
        );

        Ok(created)
    }

    /// Uploads raw notes under `{patient_id}/{uuid}{ext}` and returns the
    /// public URL.
    async fn upload_notes(&self, patient_id: &str, file: UploadedFile) -> Result<String, AppError> {
        let key = format!(
            "{}/{}{}",
            patient_id,
            Uuid::new_v4(),
            file_extension(&file.file_name)
        );
        let size = file.data.len();

        self.storage
            .upload(&key, file.data, PDF_CONTENT_TYPE)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Failed to upload raw notes");
                e
            })?;

        counter!("summary_uploads_bytes_total").increment(size as u64);

        self.storage.public_url(&key)
    }

    pub async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<SummaryListItem>, AppError> {
        let query = SummaryQuery::new()
            .filter(Filter::PatientId(patient_id.to_string()))
            .newest_first();
        self.store.select(&query).await
    }

    pub async fn list_by_date(&self, date: &str) -> Result<Vec<SummaryListItem>, AppError> {
        let (start, end) = utc_day_bounds(date)?;
        let query = SummaryQuery::new()
            .filter(Filter::CreatedAtOrAfter(start))
            .filter(Filter::CreatedAtOrBefore(end))
            .newest_first();
        self.store.select(&query).await
    }

    pub async fn list_all(&self, limit: u32) -> Result<Vec<SummaryListItem>, AppError> {
        let query = SummaryQuery::new().newest_first().limit(limit);
        self.store.select(&query).await
    }

    pub async fn get_by_id(&self, summary_id: &str) -> Result<ClinicalSummary, AppError> {
        let query = SummaryQuery::new().filter(Filter::SummaryId(summary_id.to_string()));
        self.store
            .single(&query)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Summary with ID {} not found", summary_id)))
    }

    pub async fn ready(&self) -> Result<(), AppError> {
        self.store.health_check().await
    }
}

/// Extension of `file_name` including the dot, `.pdf` when there is none.
fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".pdf".to_string())
}
