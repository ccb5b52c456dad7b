//! SQLite record store.
//!
//! Used for local runs against a copy of the table and as the relational
//! backend in tests.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, instrument};

use super::{mark_fetched_sql, RecordStore, ACK_CHUNK_SIZE};
use crate::record::FingerprintLog;
use crate::Result;

const FETCH_PENDING_SQL: &str = r#"
    SELECT id,
           COALESCE(pin, '') AS pin,
           COALESCE(attlog, '') AS attlog,
           COALESCE(cloud_id, '') AS cloud_id
    FROM tb_fps
    WHERE is_fetched = 0
    ORDER BY id
    LIMIT ?
"#;

/// SQLite implementation of [`RecordStore`]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wrap an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool against `connect_options`
    #[instrument(skip(connect_options))]
    pub async fn connect(
        connect_options: SqliteConnectOptions,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(connect_options)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<FingerprintLog>> {
        let records = sqlx::query_as::<_, FingerprintLog>(FETCH_PENDING_SQL)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn mark_fetched(&self, ids: &[i64]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0u64;

        for chunk in ids.chunks(ACK_CHUNK_SIZE) {
            let sql = mark_fetched_sql(chunk.len());
            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(*id);
            }

            // Dropping `tx` on error rolls back the earlier chunks.
            updated += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(requested = ids.len(), updated, "Marked records fetched");

        Ok(updated)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
