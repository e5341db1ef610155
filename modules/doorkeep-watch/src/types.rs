use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use doorkeep_common::{Query, ResultKey};
use doorkeep_store::StoreError;

use crate::notify::NotifyError;

/// One failure recorded during a run. Never aborts other queries or results.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("fetch failed for query \"{query}\": {error:#}")]
    Fetch { query: Query, error: anyhow::Error },

    #[error("store failed for {key} (query \"{query}\"): {error}")]
    Store {
        query: Query,
        key: ResultKey,
        error: StoreError,
    },

    #[error("notification failed for {key} (query \"{query}\"): {error}")]
    Notify {
        query: Query,
        key: ResultKey,
        error: NotifyError,
    },
}

impl RunFailure {
    pub fn query(&self) -> &Query {
        match self {
            Self::Fetch { query, .. } | Self::Store { query, .. } | Self::Notify { query, .. } => {
                query
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Store { .. } => "store",
            Self::Notify { .. } => "notify",
        }
    }
}

/// Counters for one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub run_id: Uuid,
    pub queries: u64,
    pub queries_failed: u64,
    pub results_fetched: u64,
    pub new_records: u64,
    pub seen: u64,
    pub notified: u64,
    pub notify_failed: u64,
    pub store_errors: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} queries={} queries_failed={} fetched={} new={} seen={} notified={} notify_failed={} store_errors={}",
            self.run_id,
            self.queries,
            self.queries_failed,
            self.results_fetched,
            self.new_records,
            self.seen,
            self.notified,
            self.notify_failed,
            self.store_errors,
        )
    }
}

/// Aggregate failure returned to the scheduler when any error occurred.
/// Records committed before the failure stay committed.
#[derive(Debug, Error)]
#[error("run finished with {count} failure(s): {stats}", count = .failures.len())]
pub struct RunFailed {
    pub stats: RunStats,
    pub failures: Vec<RunFailure>,
}
