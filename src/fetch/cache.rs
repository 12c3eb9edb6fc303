// src/fetch/cache.rs
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};
use tokio::sync::Mutex as Gate;
use tracing::{debug, trace};

use super::{DatasetRequest, TableSource};
use crate::error::FetchError;
use crate::junar::DataTable;

struct CacheEntry {
    table: DataTable,
    stored_at: Instant,
}

/// Time-based cache keyed by `guid:limit:offset`.
///
/// Only successful fetches are stored. Entries are never refreshed in
/// place: once expired, the next request goes to the inner source and its
/// result replaces the entry. A zero TTL disables caching.
///
/// Concurrent misses on one key are collapsed: the first caller fetches,
/// the others wait on the key's gate and then read its entry.
pub struct Cached<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<Gate<()>>>>,
}

impl<S> Cached<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Entries currently held, expired ones included until the next store.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<DataTable> {
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.table.clone())
    }

    fn store(&self, key: String, table: &DataTable) {
        let mut entries = self.entries.write().unwrap();
        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                table: table.clone(),
                stored_at: Instant::now(),
            },
        );
    }

    fn gate(&self, key: &str) -> Arc<Gate<()>> {
        let mut inflight = self.inflight.lock().unwrap();
        inflight.entry(key.to_string()).or_default().clone()
    }

    // Clones only happen under the inflight lock, so a count of 2 (map plus
    // ours) means nobody else is waiting.
    fn release(&self, key: &str, gate: Arc<Gate<()>>) {
        let mut inflight = self.inflight.lock().unwrap();
        if Arc::strong_count(&gate) <= 2 {
            inflight.remove(key);
        }
    }
}

#[async_trait]
impl<S: TableSource> TableSource for Cached<S> {
    async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
        if self.ttl.is_zero() {
            return self.inner.fetch_table(req).await;
        }

        let key = req.cache_key();
        if let Some(table) = self.lookup(&key) {
            trace!(%key, "cache hit");
            return Ok(table);
        }

        let gate = self.gate(&key);
        let result = {
            let _turn = gate.lock().await;
            match self.lookup(&key) {
                Some(table) => {
                    trace!(%key, "filled while waiting");
                    Ok(table)
                }
                None => {
                    debug!(%key, "cache miss");
                    let fetched = self.inner.fetch_table(req).await;
                    if let Ok(table) = &fetched {
                        self.store(key.clone(), table);
                    }
                    fetched
                }
            }
        };
        self.release(&key, gate);
        result
    }
}
