//! Redis-backed cache shared between bot instances.
//!
//! Expiry is delegated to Redis (`SET ... EX`).

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::backend::{CacheError, CacheResult, VerificationCache};

/// Deletes KEYS[1] only while it holds ARGV[1].
const TAKE_IF_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Redis cache backend.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub async fn new(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Unavailable(format!("Redis connection error: {}", e)))?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Unavailable(format!("Redis connection manager error: {}", e))
        })?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl VerificationCache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| CacheError::Command(e.to_string()))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| CacheError::Command(e.to_string()))
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .del(key)
            .await
            .map_err(|e| CacheError::Command(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn take_if(&self, key: &str, expected: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = redis::Script::new(TAKE_IF_SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::Command(e.to_string()))?;
        Ok(removed > 0)
    }
}
