//! Cache backends holding pending verification tokens.

mod backend;
mod memory;
#[cfg(feature = "redis-backend")]
mod redis;

use std::sync::Arc;

use tracing::info;

pub use backend::{CacheError, CacheResult, VerificationCache};
pub use memory::InMemoryCache;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisCache;

/// Open the configured cache backend.
///
/// No URL selects the in-process cache. A Redis URL requires the
/// `redis-backend` feature.
pub async fn connect(redis_url: Option<&str>) -> CacheResult<Arc<dyn VerificationCache>> {
    match redis_url {
        None => {
            info!("Using in-memory verification cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
        #[cfg(feature = "redis-backend")]
        Some(url) => {
            info!("Using Redis verification cache");
            Ok(Arc::new(RedisCache::new(url).await?))
        }
        #[cfg(not(feature = "redis-backend"))]
        Some(_) => Err(CacheError::Unavailable(
            "Redis support not compiled in (enable the redis-backend feature)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_without_url_is_in_memory() {
        let cache = connect(None).await.unwrap();
        cache.set("k", "v", Duration::from_secs(5)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
