//! Caching layer for match results.
//!
//! Provides a [`CacheService`] trait with three implementations:
//! - [`InMemoryCache`] - Process-local map with atomic whole-map invalidation
//! - [`RedisCache`] - Redis-backed cache shared between instances
//! - [`NullCache`] - No-op implementation for disabled caching

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::InMemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, CachedMatch};
