//! In-memory record store for testing.
//!
//! Mirrors the relational backends' semantics (pending filter, id order,
//! all-or-nothing acknowledge) and adds fault injection so error paths can be
//! exercised without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::record::FingerprintLog;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: FingerprintLog,
    fetched: bool,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<i64, StoredRecord>,
    next_id: i64,
    fail_on_id: Option<i64>,
    unavailable: bool,
}

/// In-memory implementation of [`RecordStore`]
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: RwLock<State>,
    /// Number of trait calls that reached the store
    calls: AtomicUsize,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert a pending record, returning its assigned id
    pub async fn insert(&self, pin: &str, log_payload: &str, origin_id: &str) -> i64 {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        state.records.insert(
            id,
            StoredRecord {
                record: FingerprintLog {
                    id,
                    pin: pin.to_string(),
                    log_payload: log_payload.to_string(),
                    origin_id: origin_id.to_string(),
                },
                fetched: false,
            },
        );
        id
    }

    /// Fetch flag of a record, `None` if it does not exist
    pub async fn is_fetched(&self, id: i64) -> Option<bool> {
        self.state.read().await.records.get(&id).map(|r| r.fetched)
    }

    /// Number of records with the fetch flag set
    pub async fn fetched_count(&self) -> usize {
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|r| r.fetched)
            .count()
    }

    /// Make `mark_fetched` fail when it reaches this id, after earlier ids of
    /// the batch were already staged
    pub async fn fail_on_id(&self, id: Option<i64>) {
        self.state.write().await.fail_on_id = id;
    }

    /// Simulate a lost connection: every operation fails
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of trait calls that reached the store
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<FingerprintLog>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        if state.unavailable {
            return Err(Error::Storage("datastore unavailable".to_string()));
        }

        Ok(state
            .records
            .values()
            .filter(|r| !r.fetched)
            .take(limit as usize)
            .map(|r| r.record.clone())
            .collect())
    }

    async fn mark_fetched(&self, ids: &[i64]) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(Error::Storage("datastore unavailable".to_string()));
        }

        // Stage every transition first; apply only if the whole batch passes.
        let mut staged = Vec::new();
        for id in ids {
            if state.fail_on_id == Some(*id) {
                return Err(Error::Storage(format!(
                    "injected fault at id {} after {} staged updates",
                    id,
                    staged.len()
                )));
            }
            if let Some(record) = state.records.get(id) {
                if !record.fetched && !staged.contains(id) {
                    staged.push(*id);
                }
            }
        }

        for id in &staged {
            if let Some(record) = state.records.get_mut(id) {
                record.fetched = true;
            }
        }

        Ok(staged.len() as u64)
    }

    async fn ping(&self) -> Result<()> {
        if self.state.read().await.unavailable {
            return Err(Error::Storage("datastore unavailable".to_string()));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
