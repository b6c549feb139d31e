pub mod datastore;
pub mod memory;
pub mod metrics;
pub mod postgrest;
pub mod storage;
pub mod summaries;

pub use datastore::{Filter, SummaryQuery, SummaryStore};
pub use memory::{MemoryStorage, MemoryStore};
pub use metrics::{get_metrics, init_metrics};
pub use postgrest::PostgrestStore;
pub use storage::{ObjectStorage, SupabaseStorage};
pub use summaries::SummaryService;
