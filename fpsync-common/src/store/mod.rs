//! Record storage abstraction
//!
//! The coordinator talks to the datastore only through [`RecordStore`], so
//! the production pool can be swapped for an in-memory store in tests.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ store                                    │
//! ├──────────────────────────────────────────┤
//! │ mod.rs    - RecordStore trait, connect() │
//! │ mysql.rs  - MySQL/MariaDB (production)   │
//! │ sqlite.rs - SQLite (local, tests)        │
//! │ memory.rs - in-memory, fault injection   │
//! └──────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::dsn::Datastore;
use crate::record::FingerprintLog;
use crate::Result;

pub mod memory;
pub mod mysql;
pub mod sqlite;

pub use memory::MemoryRecordStore;
pub use mysql::MySqlRecordStore;
pub use sqlite::SqliteRecordStore;

/// Maximum number of ids bound into a single `UPDATE ... WHERE id IN (...)`.
/// Larger batches are split into several statements inside one transaction.
pub const ACK_CHUNK_SIZE: usize = 1000;

/// Access to the fingerprint log table
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Return up to `limit` records whose fetch flag is unset, ordered by id.
    /// Read-only.
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<FingerprintLog>>;

    /// Set the fetch flag on every listed id inside one transaction.
    ///
    /// Unknown or already-fetched ids change nothing. On error no id in the
    /// batch is changed. Returns the number of rows that transitioned.
    async fn mark_fetched(&self, ids: &[i64]) -> Result<u64>;

    /// Round-trip to the datastore
    async fn ping(&self) -> Result<()>;

    /// Release pooled connections
    async fn close(&self) {}

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Pool settings used when opening a store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Parsed connection target
    pub datastore: Datastore,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection
    pub acquire_timeout: Duration,
}

/// Open the store for the configured backend and verify it answers a ping.
pub async fn connect(options: &StoreOptions) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match &options.datastore {
        Datastore::MySql(connect_options) => Arc::new(
            MySqlRecordStore::connect(
                connect_options.clone(),
                options.max_connections,
                options.acquire_timeout,
            )
            .await?,
        ),
        Datastore::Sqlite {
            options: connect_options,
            in_memory,
        } => {
            // `:memory:` databases exist per connection
            let max_connections = if *in_memory { 1 } else { options.max_connections };
            Arc::new(
                SqliteRecordStore::connect(
                    connect_options.clone(),
                    max_connections,
                    options.acquire_timeout,
                )
                .await?,
            )
        }
    };

    store.ping().await?;
    debug!(backend = store.backend(), "Datastore ping succeeded");

    Ok(store)
}

/// `?, ?, ?` for an IN list of `n` bound parameters
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Pending-to-fetched transition for one chunk of `n` ids
pub(crate) fn mark_fetched_sql(n: usize) -> String {
    format!(
        "UPDATE tb_fps SET is_fetched = 1 WHERE is_fetched = 0 AND id IN ({})",
        placeholders(n)
    )
}
