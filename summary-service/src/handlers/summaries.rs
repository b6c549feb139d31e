use crate::dtos::{ByDateParams, ListAllParams, SummaryListItemResponse, SummaryResponse};
use crate::extractors::{ApiMultipart, ApiQuery, ValidatedQuery};
use crate::models::SummaryListItem;
use crate::startup::AppState;
use crate::validation::{validate_create, CreateSummaryForm, UploadedFile};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn create_summary(
    State(state): State<AppState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart).await?;
    let summary = validate_create(form, state.config.upload.max_bytes)?;

    tracing::info!(
        patient_id = %summary.patient_id,
        raw_notes_type = summary.raw_notes_type.as_str(),
        "Creating summary"
    );

    let created = state.summaries.create(summary).await?;

    Ok((StatusCode::CREATED, Json(SummaryResponse::from(created))))
}

pub async fn list_by_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.summaries.list_by_patient(&patient_id).await?;
    Ok(Json(to_list_response(items)))
}

pub async fn list_by_date(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ByDateParams>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.summaries.list_by_date(&params.date).await?;
    Ok(Json(to_list_response(items)))
}

pub async fn list_all(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<ListAllParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = u32::try_from(params.limit)
        .map_err(|_| AppError::bad_request("limit must be between 1 and 1000"))?;

    let items = state.summaries.list_all(limit).await?;
    Ok(Json(to_list_response(items)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(summary_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.summaries.get_by_id(&summary_id).await?;
    Ok(Json(SummaryResponse::from(summary)))
}

fn to_list_response(items: Vec<SummaryListItem>) -> Vec<SummaryListItemResponse> {
    items.into_iter().map(SummaryListItemResponse::from).collect()
}

fn form_error(e: MultipartError) -> AppError {
    AppError::bad_request(format!("Failed to read multipart form: {}", e.body_text()))
}

/// Collects the create form. Unknown fields are ignored; an empty file part
/// (no name, no bytes) counts as no file.
async fn read_form(mut multipart: Multipart) -> Result<CreateSummaryForm, AppError> {
    let mut form = CreateSummaryForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "raw_notes_file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(form_error)?.to_vec();
            if !(file_name.is_empty() && data.is_empty()) {
                form.raw_notes_file = Some(UploadedFile { file_name, data });
            }
            continue;
        }

        let value = field.text().await.map_err(form_error)?;
        let slot = match name.as_str() {
            "patient_id" => &mut form.patient_id,
            "patient_name" => &mut form.patient_name,
            "summary_text" => &mut form.summary_text,
            "diagnoses" => &mut form.diagnoses,
            "affected_system" => &mut form.affected_system,
            "affected_organ" => &mut form.affected_organ,
            "animation_asset" => &mut form.animation_asset,
            "raw_notes_text" => &mut form.raw_notes_text,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown form field");
                continue;
            }
        };
        *slot = Some(value);
    }

    Ok(form)
}
