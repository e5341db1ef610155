use async_trait::async_trait;

use doorkeep_common::{ResultKey, StoredRecord};

use crate::error::Result;

/// Key-value persistence for seen results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Whether a record with this key is stored.
    async fn exists(&self, key: &ResultKey) -> Result<bool>;

    /// Insert `record` under `key` only if the key is absent.
    ///
    /// Returns `Ok(false)` when the key already exists, whether from an earlier
    /// run or a concurrent insert that won the race. The existing record is
    /// read back in that case; an unreadable one yields `StoreError::Corrupt`.
    async fn insert_if_absent(&self, key: &ResultKey, record: &StoredRecord) -> Result<bool>;

    /// Point read of a stored record.
    async fn get(&self, key: &ResultKey) -> Result<Option<StoredRecord>>;
}
