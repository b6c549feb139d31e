use super::datastore::{SummaryQuery, SummaryStore};
use crate::models::{ClinicalSummary, NewSummary, SummaryListItem};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::PropagateTraceContext;

const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Postgres `invalid_text_representation`, e.g. a malformed uuid in a filter.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Summary store backed by the datastore's PostgREST endpoint
/// (`{base_url}/rest/v1/{table}`).
pub struct PostgrestStore {
    client: Client,
    table_url: String,
    key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestStore {
    pub fn new(base_url: &str, table: &str, key: Secret<String>) -> Self {
        Self {
            client: Client::new(),
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            key,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response, AppError> {
        self.authorized(request)
            .with_trace_context()
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation = %operation, error = %e, "Datastore request failed");
                AppError::upstream(format!("Error {}: {}", operation, e))
            })
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PostgrestError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            tracing::error!(
                operation = %operation,
                status = %status,
                message = %message,
                "Datastore returned an error"
            );
            return Err(AppError::upstream(format!(
                "Error {}: datastore returned {}: {}",
                operation, status, message
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation = %operation, error = %e, "Failed to decode datastore response");
            AppError::upstream(format!("Error {}: invalid datastore response: {}", operation, e))
        })
    }
}

#[async_trait]
impl SummaryStore for PostgrestStore {
    async fn insert(&self, row: &NewSummary) -> Result<Vec<ClinicalSummary>, AppError> {
        let operation = "creating summary";
        let request = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(row);

        let response = self.send(request, operation).await?;
        Self::decode(response, operation).await
    }

    async fn select(&self, query: &SummaryQuery) -> Result<Vec<SummaryListItem>, AppError> {
        let operation = "fetching summaries";
        let request = self
            .client
            .get(&self.table_url)
            .query(&query.to_query_params(SummaryListItem::COLUMNS));

        let response = self.send(request, operation).await?;
        Self::decode(response, operation).await
    }

    async fn single(&self, query: &SummaryQuery) -> Result<Option<ClinicalSummary>, AppError> {
        let operation = "fetching summary";
        let request = self
            .client
            .get(&self.table_url)
            .query(&query.to_query_params("*"))
            .header("Accept", SINGLE_OBJECT_MEDIA_TYPE);

        let response = self.send(request, operation).await?;

        match response.status() {
            // The object media type turns "zero rows" into 406.
            StatusCode::NOT_ACCEPTABLE => return Ok(None),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                let error = serde_json::from_str::<PostgrestError>(&body).ok();
                if error.as_ref().and_then(|e| e.code.as_deref())
                    == Some(INVALID_TEXT_REPRESENTATION)
                {
                    // An id that cannot be a key cannot match a row.
                    return Ok(None);
                }
                let message = error.and_then(|e| e.message).unwrap_or(body);
                return Err(AppError::upstream(format!(
                    "Error {}: datastore returned 400 Bad Request: {}",
                    operation, message
                )));
            }
            _ => {}
        }

        Self::decode(response, operation).await.map(Some)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let operation = "checking datastore";
        let query = SummaryQuery::new().limit(1);
        let request = self
            .client
            .get(&self.table_url)
            .query(&query.to_query_params("summary_id"));

        let response = self.send(request, operation).await?;
        Self::decode::<serde_json::Value>(response, operation).await?;
        Ok(())
    }
}
