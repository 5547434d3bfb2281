//! No-op cache implementation for disabled caching.

use super::service::{CacheResult, CacheService, CachedMatch};
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Every lookup misses, so every request runs the matcher. Used when
/// `CACHE_BACKEND=none`.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<CachedMatch>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: CachedMatch) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}
