//! Narrow interface over the hosted `clinical_summaries` table.

use crate::models::{ClinicalSummary, NewSummary, SummaryListItem};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use service_core::error::AppError;

#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Inserts one row and returns what the datastore stored, including the
    /// generated `summary_id` and `created_at`. An empty vec means nothing
    /// was written.
    async fn insert(&self, row: &NewSummary) -> Result<Vec<ClinicalSummary>, AppError>;

    /// List projection of every row matching `query`.
    async fn select(&self, query: &SummaryQuery) -> Result<Vec<SummaryListItem>, AppError>;

    /// Full record of the single row matching `query`, if any.
    async fn single(&self, query: &SummaryQuery) -> Result<Option<ClinicalSummary>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    PatientId(String),
    SummaryId(String),
    CreatedAtOrAfter(DateTime<Utc>),
    CreatedAtOrBefore(DateTime<Utc>),
}

impl Filter {
    /// PostgREST horizontal filter, e.g. `("patient_id", "eq.p-1")`.
    pub fn to_query_param(&self) -> (&'static str, String) {
        match self {
            Filter::PatientId(id) => ("patient_id", format!("eq.{}", id)),
            Filter::SummaryId(id) => ("summary_id", format!("eq.{}", id)),
            Filter::CreatedAtOrAfter(ts) => ("created_at", format!("gte.{}", timestamp_param(ts))),
            Filter::CreatedAtOrBefore(ts) => {
                ("created_at", format!("lte.{}", timestamp_param(ts)))
            }
        }
    }

    pub fn matches(&self, summary: &ClinicalSummary) -> bool {
        match self {
            Filter::PatientId(id) => &summary.patient_id == id,
            Filter::SummaryId(id) => &summary.summary_id == id,
            Filter::CreatedAtOrAfter(ts) => summary.created_at >= *ts,
            Filter::CreatedAtOrBefore(ts) => summary.created_at <= *ts,
        }
    }
}

fn timestamp_param(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryQuery {
    pub filters: Vec<Filter>,
    pub newest_first: bool,
    pub limit: Option<u32>,
}

impl SummaryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order by `created_at` descending.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, summary: &ClinicalSummary) -> bool {
        self.filters.iter().all(|f| f.matches(summary))
    }

    /// Renders the query as PostgREST URL parameters selecting `columns`.
    pub fn to_query_params(&self, columns: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", columns.to_string())];
        params.extend(self.filters.iter().map(Filter::to_query_param));
        if self.newest_first {
            params.push(("order", "created_at.desc".to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}
