use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use doorkeep_common::{ResultKey, StoredRecord};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::store::ResultStore;

type Rows = HashMap<ResultKey, (serde_json::Value, DateTime<Utc>)>;

/// In-process result store. Check and insert happen under one lock, so the
/// conditional write is atomic across tasks sharing the store.
#[derive(Default)]
pub struct MemoryResultStore {
    rows: Mutex<Rows>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw attributes under `key`, bypassing encoding. Lets callers
    /// reproduce records written by older or broken writers.
    pub fn seed_raw(&self, key: ResultKey, attributes: serde_json::Value) -> Result<()> {
        self.lock()?.insert(key, (attributes, Utc::now()));
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn exists(&self, key: &ResultKey) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    async fn insert_if_absent(&self, key: &ResultKey, record: &StoredRecord) -> Result<bool> {
        let attributes = codec::encode(record)?;
        let mut rows = self.lock()?;

        if let Some((existing, first_seen_at)) = rows.get(key) {
            codec::decode(key, existing.clone(), *first_seen_at)?;
            return Ok(false);
        }

        rows.insert(key.clone(), (attributes, record.first_seen_at));
        Ok(true)
    }

    async fn get(&self, key: &ResultKey) -> Result<Option<StoredRecord>> {
        let row = self.lock()?.get(key).cloned();
        row.map(|(attributes, first_seen_at)| codec::decode(key, attributes, first_seen_at))
            .transpose()
    }
}
