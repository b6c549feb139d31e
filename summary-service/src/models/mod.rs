pub mod summary;

pub use summary::{
    parse_datastore_timestamp, ClinicalSummary, NewSummary, RawNotesType, SummaryListItem,
};
