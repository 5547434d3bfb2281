//! Cache service trait and error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors that can occur during cache operations.
///
/// Never surfaced to HTTP clients: callers log them and match directly.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
    #[error("Cache entry could not be decoded: {0}")]
    DecodeError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A memoized matcher outcome.
///
/// Only the rule id is stored; the rule itself is looked up in the published
/// index, so an entry can never resurrect a rule that is no longer published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedMatch {
    Rule(i64),
    NoMatch,
}

/// Trait for caching `signature → match` results.
///
/// Keys are generation-scoped by the caller, so an entry written against an
/// old rule set is unreachable once a new one is published.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::InMemoryCache`] - Process-local map, swapped on invalidation
/// - [`crate::infrastructure::cache::RedisCache`] - Shared Redis cache with TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up a cached outcome.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))` on cache hit (including a cached no-match)
    /// - `Ok(None)` on cache miss
    async fn get(&self, key: &str) -> CacheResult<Option<CachedMatch>>;

    /// Stores an outcome.
    async fn put(&self, key: &str, value: CachedMatch) -> CacheResult<()>;

    /// Drops every entry.
    ///
    /// Called synchronously by publish before it returns.
    async fn invalidate_all(&self) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
