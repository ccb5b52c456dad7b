//! Fetch/acknowledge coordinator
//!
//! Consumers poll in two phases:
//!
//! 1. **Fetch** returns a bounded batch of pending records and changes nothing.
//! 2. **Acknowledge** names the ids the consumer processed; they move from
//!    pending to fetched in one transaction.
//!
//! A record is therefore never marked consumed unless a consumer asked for it
//! after receiving it, and a consumer that crashes between the two calls sees
//! the same records again on its next fetch. Acknowledge is idempotent, so a
//! failed batch can be retried whole.
//!
//! Fetch does not claim rows: two consumers polling at once may receive
//! overlapping batches.

use std::sync::Arc;

use tracing::{debug, info};

use crate::record::FingerprintLog;
use crate::store::RecordStore;
use crate::{Error, Result};

/// Default cap on records returned by one fetch
pub const DEFAULT_FETCH_LIMIT: u32 = 1000;

/// Largest configurable fetch cap
pub const MAX_FETCH_LIMIT: u32 = 10_000;

/// Default cap on ids accepted by one acknowledge
pub const DEFAULT_MAX_ACK_IDS: usize = 10_000;

/// Coordinates fetch and acknowledge over an injected [`RecordStore`]
#[derive(Clone)]
pub struct SyncCoordinator {
    store: Arc<dyn RecordStore>,
    fetch_limit: u32,
    max_ack_ids: usize,
}

impl SyncCoordinator {
    /// Create a coordinator with default limits
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            max_ack_ids: DEFAULT_MAX_ACK_IDS,
        }
    }

    /// Override the fetch and acknowledge caps
    pub fn with_limits(mut self, fetch_limit: u32, max_ack_ids: usize) -> Self {
        self.fetch_limit = fetch_limit;
        self.max_ack_ids = max_ack_ids;
        self
    }

    /// Injected store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Return up to `fetch_limit` pending records. Read-only.
    pub async fn fetch(&self) -> Result<Vec<FingerprintLog>> {
        let mut records = self.store.fetch_pending(self.fetch_limit).await?;
        records.truncate(self.fetch_limit as usize);

        info!(
            count = records.len(),
            limit = self.fetch_limit,
            "Fetched pending records"
        );
        Ok(records)
    }

    /// Mark the given ids fetched, all or nothing.
    ///
    /// Rejects an empty batch or one larger than `max_ack_ids` without
    /// touching the store. Duplicate ids are collapsed. Returns the number of
    /// records that transitioned; unknown or already-fetched ids count as zero.
    pub async fn acknowledge(&self, ids: Vec<i64>) -> Result<u64> {
        if ids.is_empty() {
            return Err(Error::InvalidInput("ids must not be empty".to_string()));
        }

        let mut ids = ids;
        ids.sort_unstable();
        ids.dedup();

        if ids.len() > self.max_ack_ids {
            return Err(Error::InvalidInput(format!(
                "too many ids: {} (max {})",
                ids.len(),
                self.max_ack_ids
            )));
        }

        debug!(count = ids.len(), "Acknowledging records");
        let updated = self.store.mark_fetched(&ids).await?;

        info!(requested = ids.len(), updated, "Acknowledged records");
        Ok(updated)
    }
}
