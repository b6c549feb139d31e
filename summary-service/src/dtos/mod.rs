pub mod summaries;

pub use summaries::{
    ByDateParams, ListAllParams, SummaryListItemResponse, SummaryResponse, DEFAULT_LIST_LIMIT,
};
