//! Redis-backed [`CacheBackend`].
//!
//! Uses a `deadpool-redis` connection pool and the `redis` crate's async
//! commands, with [`redis::Script`] carrying the atomic disable-check-then
//! -install primitive as a single server-side Lua script.
//!
//! # Examples
//!
//! ```no_run
//! use concache::store::CacheBackend;
//! use concache::store::redis::RedisBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisBackend::new("redis://127.0.0.1:6379", 16)?;
//! store.set_with_expiry("example_key", "example_value", 60).await?;
//! let retrieved = store.get("example_key").await?;
//! assert_eq!(retrieved, Some("example_value".to_string()));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use redis::Script;

use crate::error::StoreError;
use crate::store::CacheBackend;

/// The atomic install script: `KEYS[1]` is the disable key, `KEYS[2]` is the
/// value key, `ARGV[1]` is the value to install, `ARGV[2]` is the TTL in
/// seconds.
pub const SCRIPT_PUT_IF_ENABLED: &str = r"
local disable_key = KEYS[1]
if redis.call('get', disable_key) then return 0 end
local key = KEYS[2]
local value = ARGV[1]
redis.call('set', key, value)
redis.call('expire', key, tonumber(ARGV[2]))
return 1
";

/// A [`CacheBackend`] implementation backed by a Redis (or Redis-compatible)
/// server reached through a `deadpool-redis` connection pool.
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
    script: Script,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Creates a new Redis-backed store, building a connection pool of at
    /// most `pool_size` connections to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `redis_url` can't be parsed
    /// or the pool fails to build.
    pub fn new(redis_url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .builder()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?
            .max_size(pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            pool,
            script: Script::new(SCRIPT_PUT_IF_ENABLED),
        })
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(Box::new(e)))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|e| StoreError::Command(Box::new(e)))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| StoreError::Command(Box::new(e)))
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| StoreError::Command(Box::new(e)))
    }

    async fn shorten_expiry_millis(&self, key: &str, millis: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        // PEXPIRE on a missing key returns 0 rather than erroring, matching
        // the no-op-on-absence semantics this trait method documents.
        conn.pexpire::<_, ()>(key, millis as i64)
            .await
            .map_err(|e| StoreError::Command(Box::new(e)))
    }

    async fn put_if_enabled(
        &self,
        disable_key: &str,
        value_key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let installed: i64 = self
            .script
            .key(disable_key)
            .key(value_key)
            .arg(value)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(Box::new(e)))?;
        Ok(installed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
    }

    #[test]
    fn invalid_url_is_rejected() {
        let store = RedisBackend::new("not-a-redis-url", 4);
        assert!(store.is_err());
    }

    #[tokio::test]
    #[ignore = "requires a running redis instance"]
    async fn set_and_get_roundtrip() {
        let store = RedisBackend::new(&redis_url(), 4).unwrap();
        store.set_with_expiry("concache_test_key", "hello", 30).await.unwrap();
        assert_eq!(store.get("concache_test_key").await.unwrap(), Some("hello".to_string()));
        store.del("concache_test_key").await.unwrap();
        assert_eq!(store.get("concache_test_key").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running redis instance"]
    async fn put_if_enabled_rejects_when_disabled() {
        let store = RedisBackend::new(&redis_url(), 4).unwrap();
        let disable_key = "concache_test_disable";
        let value_key = "concache_test_value";
        store.del(disable_key).await.unwrap();
        store.del(value_key).await.unwrap();

        store.set_with_expiry(disable_key, "1", 10).await.unwrap();
        let installed = store.put_if_enabled(disable_key, value_key, "v", 30).await.unwrap();
        assert!(!installed);
        assert_eq!(store.get(value_key).await.unwrap(), None);

        store.del(disable_key).await.unwrap();
        let installed = store.put_if_enabled(disable_key, value_key, "v", 30).await.unwrap();
        assert!(installed);
        assert_eq!(store.get(value_key).await.unwrap(), Some("v".to_string()));
    }
}
