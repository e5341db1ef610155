use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use doorkeep_common::Query;
use doorkeep_store::ResultStore;

use crate::dedup::Deduplicator;
use crate::notify::{format_alert, NotifyBackend};
use crate::search::Searcher;
use crate::types::{RunFailed, RunFailure, RunStats};

/// Counters and failures for a single query.
#[derive(Default)]
struct QueryOutcome {
    fetched: u64,
    new_records: u64,
    seen: u64,
    notified: u64,
    notify_failed: u64,
    store_errors: u64,
    fetch_failed: bool,
    failures: Vec<RunFailure>,
}

/// Drives one invocation: search each query, dedup its batch, alert on every
/// new result.
pub struct Watcher {
    searcher: Arc<dyn Searcher>,
    dedup: Deduplicator,
    notifier: Arc<dyn NotifyBackend>,
    query_concurrency: usize,
}

impl Watcher {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        store: Arc<dyn ResultStore>,
        notifier: Arc<dyn NotifyBackend>,
    ) -> Self {
        Self {
            searcher,
            dedup: Deduplicator::new(store),
            notifier,
            query_concurrency: 1,
        }
    }

    /// Process up to `n` queries at once. Results inside a batch stay ordered.
    pub fn with_query_concurrency(mut self, n: usize) -> Self {
        self.query_concurrency = n.max(1);
        self
    }

    /// Run every query. Failures are collected, never short-circuited; any
    /// failure makes the whole run `Err`, with stats for what did happen.
    pub async fn run(&self, queries: &[Query]) -> Result<RunStats, RunFailed> {
        let mut stats = RunStats {
            run_id: Uuid::new_v4(),
            queries: queries.len() as u64,
            ..Default::default()
        };
        info!(run_id = %stats.run_id, queries = queries.len(), "Doorkeep run starting");

        let outcomes: Vec<QueryOutcome> = stream::iter(queries)
            .map(|query| self.run_query(query))
            .buffered(self.query_concurrency)
            .collect()
            .await;

        let mut failures = Vec::new();
        for outcome in outcomes {
            stats.results_fetched += outcome.fetched;
            stats.new_records += outcome.new_records;
            stats.seen += outcome.seen;
            stats.notified += outcome.notified;
            stats.notify_failed += outcome.notify_failed;
            stats.store_errors += outcome.store_errors;
            if outcome.fetch_failed {
                stats.queries_failed += 1;
            }
            failures.extend(outcome.failures);
        }

        if failures.is_empty() {
            info!("Doorkeep run complete. {stats}");
            Ok(stats)
        } else {
            warn!(failures = failures.len(), "Doorkeep run finished with failures. {stats}");
            Err(RunFailed { stats, failures })
        }
    }

    async fn run_query(&self, query: &Query) -> QueryOutcome {
        let mut outcome = QueryOutcome::default();

        let batch = match self.searcher.search(query).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(query = %query, error = %format!("{e:#}"), "Search failed, skipping query");
                outcome.fetch_failed = true;
                outcome.failures.push(RunFailure::Fetch {
                    query: query.clone(),
                    error: e,
                });
                return outcome;
            }
        };
        outcome.fetched = batch.len() as u64;

        let dedup = self.dedup.process(&batch).await;
        outcome.seen = dedup.seen as u64;
        outcome.new_records = dedup.new_records.len() as u64;
        outcome.store_errors = dedup.errors.len() as u64;
        outcome
            .failures
            .extend(dedup.errors.into_iter().map(|e| RunFailure::Store {
                query: query.clone(),
                key: e.key,
                error: e.cause,
            }));

        info!(
            query = %query,
            fetched = outcome.fetched,
            new = outcome.new_records,
            seen = outcome.seen,
            "Batch classified"
        );

        // Records are already committed; a failed delivery is reported but
        // never rolls the record back, so it won't be re-sent next run.
        for record in dedup.new_records {
            let message = format_alert(&record);
            match self.notifier.deliver(&message).await {
                Ok(()) => {
                    info!(query = %query, key = %record.key, "Alert sent");
                    outcome.notified += 1;
                }
                Err(e) => {
                    warn!(query = %query, key = %record.key, error = %e, "Failed to send alert");
                    outcome.notify_failed += 1;
                    outcome.failures.push(RunFailure::Notify {
                        query: query.clone(),
                        key: record.key,
                        error: e,
                    });
                }
            }
        }

        outcome
    }
}
