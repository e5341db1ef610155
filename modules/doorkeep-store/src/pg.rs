use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use doorkeep_common::config::is_valid_table_name;
use doorkeep_common::{ResultKey, StoredRecord};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::store::ResultStore;

/// Postgres-backed result store. One row per `(title, link)`.
#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
    table: String,
}

impl PgResultStore {
    /// The table name is interpolated into SQL, so it must be a plain identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(StoreError::InvalidTable(table));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the results table if it doesn't exist. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                title          TEXT         NOT NULL,
                link           TEXT         NOT NULL,
                attributes     JSONB        NOT NULL,
                first_seen_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
                PRIMARY KEY (title, link)
            )
            "#,
            table = self.table
        ))
        .execute(&self.pool)
        .await?;

        info!(table = %self.table, "Result table ready");
        Ok(())
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<i64> {
        let n = sqlx::query_scalar::<_, i64>(&format!("SELECT count(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn exists(&self, key: &ResultKey) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE title = $1 AND link = $2)",
            self.table
        ))
        .bind(&key.title)
        .bind(&key.link)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_if_absent(&self, key: &ResultKey, record: &StoredRecord) -> Result<bool> {
        let attributes = codec::encode(record)?;

        // ON CONFLICT DO NOTHING returns no row when the key already exists,
        // including when a concurrent transaction inserted it first.
        let inserted = sqlx::query_scalar::<_, bool>(&format!(
            r#"
            INSERT INTO {} (title, link, attributes, first_seen_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (title, link) DO NOTHING
            RETURNING true
            "#,
            self.table
        ))
        .bind(&key.title)
        .bind(&key.link)
        .bind(&attributes)
        .bind(record.first_seen_at)
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        if inserted {
            return Ok(true);
        }

        if self.get(key).await?.is_none() {
            warn!(%key, table = %self.table, "Insert conflicted but no row was readable");
        }
        Ok(false)
    }

    async fn get(&self, key: &ResultKey) -> Result<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, (serde_json::Value, DateTime<Utc>)>(&format!(
            "SELECT attributes, first_seen_at FROM {} WHERE title = $1 AND link = $2",
            self.table
        ))
        .bind(&key.title)
        .bind(&key.link)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(attributes, first_seen_at)| codec::decode(key, attributes, first_seen_at))
            .transpose()
    }
}
