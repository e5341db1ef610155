use doorkeep_common::ResultKey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient backend failure. The whole batch can be retried next run.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// An existing record for this key cannot be read back.
    #[error("Stored record for {key} is corrupt: {reason}")]
    Corrupt { key: ResultKey, reason: String },

    #[error("Failed to encode record for {key}: {reason}")]
    Encode { key: ResultKey, reason: String },

    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),
}

impl StoreError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
