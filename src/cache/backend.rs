//! Pluggable key/value store for short-lived verification state.
//!
//! Swappable between an in-process map (single process, tests) and Redis
//! (shared between bot instances).

use std::time::Duration;

use async_trait::async_trait;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from cache backend operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Cache command failed: {0}")]
    Command(String),
}

/// Key/value cache with per-entry expiry.
///
/// Implementations must be thread-safe. Expired entries must never be
/// returned by `get`.
#[async_trait]
pub trait VerificationCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Fetch a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Remove a key. Returns true when a live value was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Atomically remove `key` if it still holds `expected`.
    ///
    /// Returns true only for the one caller that removed the live value.
    async fn take_if(&self, key: &str, expected: &str) -> CacheResult<bool>;
}
