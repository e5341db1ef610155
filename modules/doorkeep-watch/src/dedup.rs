use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use doorkeep_common::{ResultKey, SearchResult, StoredRecord};
use doorkeep_store::{ResultStore, StoreError};

/// A store failure for one result. The rest of the batch still runs.
#[derive(Debug)]
pub struct ProcessError {
    pub key: ResultKey,
    pub cause: StoreError,
}

/// Classification of one batch.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    /// Committed in this call, in batch order.
    pub new_records: Vec<StoredRecord>,
    /// Already stored, including batch-internal repeats and corrupt rows.
    pub seen: usize,
    pub errors: Vec<ProcessError>,
}

/// Splits a batch into NEW and SEEN against the store, committing NEW results.
pub struct Deduplicator {
    store: Arc<dyn ResultStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Process results in order. A result is NEW only if this call's
    /// conditional insert created its key, so a repeat later in the same batch
    /// is SEEN.
    pub async fn process(&self, batch: &[SearchResult]) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();

        for result in batch {
            let record = StoredRecord::new(result.clone(), Utc::now());

            match self.store.insert_if_absent(&record.key, &record).await {
                Ok(true) => {
                    debug!(key = %record.key, "New result");
                    outcome.new_records.push(record);
                }
                Ok(false) => {
                    outcome.seen += 1;
                }
                Err(e) if e.is_corrupt() => {
                    // An unreadable row still proves the key was stored once.
                    warn!(key = %record.key, error = %e, "Corrupt stored record, treating as seen");
                    outcome.seen += 1;
                    outcome.errors.push(ProcessError {
                        key: record.key,
                        cause: e,
                    });
                }
                Err(e) => {
                    warn!(key = %record.key, error = %e, "Failed to record result, skipping");
                    outcome.errors.push(ProcessError {
                        key: record.key,
                        cause: e,
                    });
                }
            }
        }

        outcome
    }
}
