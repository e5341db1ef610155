// Test mocks for the watch pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockSearcher (Searcher) — HashMap-based query→batch, or a scripted failure
// - FailingStore (ResultStore) — MemoryResultStore that errors for chosen titles
// - RecordingBackend (NotifyBackend) — captures delivered alerts, can fail on demand
//
// Plus `result()` for building search results.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use doorkeep_common::{Query, ResultKey, SearchResult, StoredRecord};
use doorkeep_store::{MemoryResultStore, ResultStore, StoreError};

use crate::notify::{AlertMessage, NotifyBackend, NotifyError};
use crate::search::Searcher;

/// Search result with a snippet derived from the title.
pub fn result(title: &str, link: &str) -> SearchResult {
    SearchResult::new(title, link).with_snippet(format!("snippet for {title}"))
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

enum Scripted {
    Batch(Vec<SearchResult>),
    Failure(String),
}

/// Returns `Err` for unregistered queries.
/// Builder pattern: `.on_query()`, `.on_failure()`.
#[derive(Default)]
pub struct MockSearcher {
    scripts: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(mut self, query: &str, batch: Vec<SearchResult>) -> Self {
        self.scripts.insert(query.to_string(), Scripted::Batch(batch));
        self
    }

    pub fn on_failure(mut self, query: &str, message: &str) -> Self {
        self.scripts
            .insert(query.to_string(), Scripted::Failure(message.to_string()));
        self
    }

    /// Queries searched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    async fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        self.calls.lock().unwrap().push(query.to_string());
        match self.scripts.get(query.as_str()) {
            Some(Scripted::Batch(batch)) => Ok(batch.clone()),
            Some(Scripted::Failure(message)) => bail!("{message}"),
            None => bail!("MockSearcher: no batch registered for \"{query}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// FailingStore
// ---------------------------------------------------------------------------

/// In-memory store that reports `Unavailable` for results with chosen titles.
pub struct FailingStore {
    inner: MemoryResultStore,
    failing_titles: HashSet<String>,
}

impl FailingStore {
    pub fn unavailable_for<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            inner: MemoryResultStore::new(),
            failing_titles: titles.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn inner(&self) -> &MemoryResultStore {
        &self.inner
    }

    fn check(&self, key: &ResultKey) -> doorkeep_store::Result<()> {
        if self.failing_titles.contains(&key.title) {
            return Err(StoreError::Unavailable(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultStore for FailingStore {
    async fn exists(&self, key: &ResultKey) -> doorkeep_store::Result<bool> {
        self.check(key)?;
        self.inner.exists(key).await
    }

    async fn insert_if_absent(
        &self,
        key: &ResultKey,
        record: &StoredRecord,
    ) -> doorkeep_store::Result<bool> {
        self.check(key)?;
        self.inner.insert_if_absent(key, record).await
    }

    async fn get(&self, key: &ResultKey) -> doorkeep_store::Result<Option<StoredRecord>> {
        self.check(key)?;
        self.inner.get(key).await
    }
}

// ---------------------------------------------------------------------------
// RecordingBackend
// ---------------------------------------------------------------------------

/// Captures every delivery attempt. Deliveries whose body mentions one of the
/// failing titles return `Err` (and are still recorded as attempts).
#[derive(Default)]
pub struct RecordingBackend {
    attempts: Mutex<Vec<AlertMessage>>,
    failing_titles: HashSet<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing_titles: titles.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn attempts(&self) -> Vec<AlertMessage> {
        self.attempts.lock().unwrap().clone()
    }

    /// Body text of every attempted alert.
    pub fn bodies(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .filter_map(|m| m.blocks.get(1).map(|b| b.text.text.clone()))
            .collect()
    }

    /// How many attempts linked to `link` with label `title`.
    pub fn count_for(&self, title: &str, link: &str) -> usize {
        let needle = format!("<{link}|{title}>");
        self.bodies().iter().filter(|b| b.starts_with(&needle)).count()
    }
}

#[async_trait]
impl NotifyBackend for RecordingBackend {
    async fn deliver(&self, message: &AlertMessage) -> crate::notify::error::Result<()> {
        self.attempts.lock().unwrap().push(message.clone());

        let body = message
            .blocks
            .get(1)
            .map(|b| b.text.text.as_str())
            .unwrap_or_default();
        if self
            .failing_titles
            .iter()
            .any(|t| body.contains(&format!("|{t}>")))
        {
            return Err(NotifyError::Transport(
                "RecordingBackend: injected delivery failure".to_string(),
            ));
        }
        Ok(())
    }
}
