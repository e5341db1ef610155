//! Record <-> stored attributes. Shared by every backend so they agree on what
//! counts as a corrupt record.

use chrono::{DateTime, Utc};
use doorkeep_common::{ResultKey, SearchResult, StoredRecord};

use crate::error::{Result, StoreError};

pub fn encode(record: &StoredRecord) -> Result<serde_json::Value> {
    serde_json::to_value(&record.result).map_err(|e| StoreError::Encode {
        key: record.key.clone(),
        reason: e.to_string(),
    })
}

pub fn decode(
    key: &ResultKey,
    attributes: serde_json::Value,
    first_seen_at: DateTime<Utc>,
) -> Result<StoredRecord> {
    let result: SearchResult =
        serde_json::from_value(attributes).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;

    if result.key() != *key {
        return Err(StoreError::Corrupt {
            key: key.clone(),
            reason: format!("attributes belong to {}", result.key()),
        });
    }

    Ok(StoredRecord {
        key: key.clone(),
        result,
        first_seen_at,
    })
}
