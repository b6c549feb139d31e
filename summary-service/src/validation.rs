//! Input checks for summary creation and listing.
//!
//! `validate_create` runs its rules in a fixed order and stops at the first
//! failure, so callers always get the same error for the same input:
//!
//! 1. `diagnoses` is a JSON array of strings
//! 2. `patient_id`, `patient_name`, `summary_text` are present and non-blank
//! 3. raw notes come from text or a file, never both
//! 4. an uploaded file is named `*.pdf`
//! 5. an uploaded file is within the size limit

use crate::models::RawNotesType;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use service_core::error::AppError;

/// A file part from the create form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Raw multipart fields, before any checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateSummaryForm {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub summary_text: Option<String>,
    pub diagnoses: Option<String>,
    pub affected_system: Option<String>,
    pub affected_organ: Option<String>,
    pub animation_asset: Option<String>,
    pub raw_notes_text: Option<String>,
    pub raw_notes_file: Option<UploadedFile>,
}

/// A create request that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSummary {
    pub patient_id: String,
    pub patient_name: String,
    pub summary_text: String,
    pub diagnoses: Vec<String>,
    pub affected_system: Option<String>,
    pub affected_organ: Option<String>,
    pub animation_asset: Option<String>,
    pub raw_notes_type: RawNotesType,
    pub raw_notes_text: Option<String>,
    pub raw_notes_file: Option<UploadedFile>,
}

pub fn validate_create(
    form: CreateSummaryForm,
    max_upload_bytes: usize,
) -> Result<ValidatedSummary, AppError> {
    let diagnoses = parse_diagnoses(form.diagnoses.as_deref())?;

    let patient_id = require_field("patient_id", form.patient_id)?;
    let patient_name = require_field("patient_name", form.patient_name)?;
    let summary_text = require_field("summary_text", form.summary_text)?;

    ensure_single_notes_source(form.raw_notes_text.as_deref(), form.raw_notes_file.as_ref())?;

    if let Some(file) = &form.raw_notes_file {
        ensure_pdf_name(&file.file_name)?;
        ensure_within_limit(file, max_upload_bytes)?;
    }

    let raw_notes_type = RawNotesType::derive(
        form.raw_notes_text.as_deref(),
        form.raw_notes_file.is_some(),
    );
    let raw_notes_text = match raw_notes_type {
        RawNotesType::Text => form.raw_notes_text,
        _ => None,
    };

    Ok(ValidatedSummary {
        patient_id,
        patient_name,
        summary_text,
        diagnoses,
        affected_system: non_blank(form.affected_system),
        affected_organ: non_blank(form.affected_organ),
        animation_asset: non_blank(form.animation_asset),
        raw_notes_type,
        raw_notes_text,
        raw_notes_file: form.raw_notes_file,
    })
}

/// Absent or empty input means no diagnoses. Whitespace-only input is not
/// empty: it is invalid JSON.
pub fn parse_diagnoses(raw: Option<&str>) -> Result<Vec<String>, AppError> {
    let raw = match raw {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let value: serde_json::Value = serde_json::from_str(raw).map_err(|_| {
        AppError::bad_request("Invalid JSON format for diagnoses field. Expected JSON array.")
    })?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(AppError::bad_request("Diagnoses must be a JSON array")),
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(AppError::bad_request(
                "Diagnoses must be a JSON array of strings",
            )),
        })
        .collect()
}

fn require_field(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::bad_request(format!("{} is required", name))),
    }
}

fn ensure_single_notes_source(
    raw_notes_text: Option<&str>,
    raw_notes_file: Option<&UploadedFile>,
) -> Result<(), AppError> {
    let has_text = raw_notes_text.is_some_and(|t| !t.is_empty());
    if has_text && raw_notes_file.is_some() {
        return Err(AppError::bad_request(
            "Cannot provide both raw_notes_text and raw_notes_file. Choose one.",
        ));
    }
    Ok(())
}

fn ensure_pdf_name(file_name: &str) -> Result<(), AppError> {
    if !file_name.ends_with(".pdf") {
        return Err(AppError::bad_request(
            "Only PDF files are allowed for raw_notes_file",
        ));
    }
    Ok(())
}

fn ensure_within_limit(file: &UploadedFile, max_upload_bytes: usize) -> Result<(), AppError> {
    if file.data.len() > max_upload_bytes {
        return Err(AppError::bad_request(format!(
            "raw_notes_file is too large (max {} bytes)",
            max_upload_bytes
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Inclusive UTC bounds of a `YYYY-MM-DD` calendar day:
/// `[00:00:00.000000, 23:59:59.999999]`.
pub fn utc_day_bounds(date: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let invalid = || AppError::bad_request("Invalid date format. Use YYYY-MM-DD");

    // chrono tolerates unpadded fields; the API contract does not.
    let well_formed = date.len() == 10
        && date.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    let last_micro = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).ok_or_else(invalid)?;

    Ok((
        day.and_time(midnight).and_utc(),
        day.and_time(last_micro).and_utc(),
    ))
}
