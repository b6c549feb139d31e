pub mod health;
pub mod summaries;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use summaries::{create_summary, get_summary, list_all, list_by_date, list_by_patient};
