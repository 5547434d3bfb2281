//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, CachedMatch};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Number of keys requested per `SCAN` step during invalidation.
const SCAN_BATCH: usize = 500;

/// Redis cache shared between instances.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection
/// reuse. Entries carry a TTL to bound storage; invalidation deletes every
/// key under the prefix.
pub struct RedisCache {
    client: ConnectionManager,
    ttl_seconds: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            ttl_seconds,
            key_prefix: "redirect:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedMatch>> {
        let redis_key = self.build_key(key);
        let mut conn = self.client.clone();

        let raw = conn
            .get::<_, Option<String>>(&redis_key)
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {}: {}", redis_key, e)))?;

        match raw {
            Some(raw) => {
                debug!("Cache HIT: {}", key);
                serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|e| CacheError::DecodeError(e.to_string()))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: CachedMatch) -> CacheResult<()> {
        let redis_key = self.build_key(key);
        let mut conn = self.client.clone();
        let encoded =
            serde_json::to_string(&value).map_err(|e| CacheError::DecodeError(e.to_string()))?;

        conn.set_ex::<_, _, ()>(&redis_key, encoded, self.ttl_seconds)
            .await
            .map_err(|e| CacheError::OperationError(format!("SET {}: {}", redis_key, e)))?;

        debug!("Cache SET: {} (TTL: {}s)", key, self.ttl_seconds);
        Ok(())
    }

    async fn invalidate_all(&self) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::OperationError(format!("SCAN: {}", e)))?;

            if !keys.is_empty() {
                deleted += keys.len();
                conn.del::<_, ()>(keys)
                    .await
                    .map_err(|e| CacheError::OperationError(format!("DEL: {}", e)))?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(deleted, "Cache INVALIDATE ALL (redis)");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
