//! In-process cache with whole-map invalidation.

use super::service::{CacheResult, CacheService, CachedMatch};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Concurrent map of cached outcomes.
///
/// Readers and writers share a [`DashMap`]; [`CacheService::invalidate_all`]
/// swaps in a fresh map atomically instead of clearing in place, so no reader
/// ever sees a half-cleared cache. Entries never expire individually. Once
/// `max_entries` is reached new keys are not stored until the next
/// invalidation.
pub struct InMemoryCache {
    entries: ArcSwap<DashMap<String, CachedMatch>>,
    max_entries: usize,
}

impl InMemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: ArcSwap::from_pointee(DashMap::new()),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedMatch>> {
        let entries = self.entries.load();
        Ok(entries.get(key).map(|entry| *entry.value()))
    }

    async fn put(&self, key: &str, value: CachedMatch) -> CacheResult<()> {
        let entries = self.entries.load();
        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            debug!(key, "Cache full, entry not stored");
            return Ok(());
        }

        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        self.entries.store(Arc::new(DashMap::new()));
        debug!("Cache INVALIDATE ALL (memory)");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
