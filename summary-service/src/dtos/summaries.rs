use crate::models::{ClinicalSummary, RawNotesType, SummaryListItem};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub summary_text: String,
    pub diagnoses: Vec<String>,
    pub affected_system: Option<String>,
    pub affected_organ: Option<String>,
    pub animation_asset: Option<String>,
    pub raw_notes_type: RawNotesType,
    pub raw_notes_text: Option<String>,
    pub raw_notes_file_url: Option<String>,
    pub created_at: String,
}

impl From<ClinicalSummary> for SummaryResponse {
    fn from(summary: ClinicalSummary) -> Self {
        Self {
            summary_id: summary.summary_id,
            patient_id: summary.patient_id,
            patient_name: summary.patient_name,
            summary_text: summary.summary_text,
            diagnoses: summary.diagnoses,
            affected_system: summary.affected_system,
            affected_organ: summary.affected_organ,
            animation_asset: summary.animation_asset,
            raw_notes_type: summary.raw_notes_type,
            raw_notes_text: summary.raw_notes_text,
            raw_notes_file_url: summary.raw_notes_file_url,
            created_at: summary
                .created_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryListItemResponse {
    pub summary_id: String,
    pub patient_name: String,
    pub summary_text: String,
    pub affected_organ: Option<String>,
    pub animation_asset: Option<String>,
    pub created_at: String,
}

impl From<SummaryListItem> for SummaryListItemResponse {
    fn from(item: SummaryListItem) -> Self {
        Self {
            summary_id: item.summary_id,
            patient_name: item.patient_name,
            summary_text: item.summary_text,
            affected_organ: item.affected_organ,
            animation_asset: item.animation_asset,
            created_at: item.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListAllParams {
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct ByDateParams {
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: String,
}
