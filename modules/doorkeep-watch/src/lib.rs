pub mod dedup;
pub mod notify;
pub mod search;
pub mod testing;
pub mod types;
pub mod watcher;

pub use dedup::{DedupOutcome, Deduplicator, ProcessError};
pub use search::Searcher;
pub use types::{RunFailed, RunFailure, RunStats};
pub use watcher::Watcher;
