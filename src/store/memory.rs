//! An in-process [`CacheBackend`] for tests and single-node development.
//!
//! Every entry carries a real deadline tracked against
//! [`tokio::time::Instant`], and [`get`](MemoryBackend::get) prunes it
//! lazily on read. TTL expiry has to actually happen for the timing-based
//! consistency properties this crate offers to be observable in tests.
//!
//! The atomic install primitive is implemented as ordinary Rust code inside
//! a single `tokio::sync::Mutex` critical section — correct here because the
//! mutex itself is the "shard": there's only one process, so holding the
//! lock across the whole check-then-set sequence gives the same atomicity
//! guarantee the Redis Lua script gives across a cluster shard.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::store::CacheBackend;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// An in-memory, process-local [`CacheBackend`] backed by a
/// `tokio::sync::Mutex<HashMap<..>>`.
///
/// # Examples
///
/// ```
/// use concache::store::CacheBackend;
/// use concache::store::memory::MemoryBackend;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryBackend::new();
/// store.set_with_expiry("k", "v", 60).await.unwrap();
/// assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
/// # }
/// ```
#[derive(Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

impl MemoryBackend {
    /// Creates a new, empty in-memory cache store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + std::time::Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn shorten_expiry_millis(&self, key: &str, millis: u64) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Instant::now() + std::time::Duration::from_millis(millis);
        }
        // Absent key: no-op, matching the Redis PEXPIRE-on-missing-key
        // semantics documented on `CacheBackend::shorten_expiry_millis`.
        Ok(())
    }

    async fn put_if_enabled(
        &self,
        disable_key: &str,
        value_key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        let disabled = entries
            .get(disable_key)
            .is_some_and(|e| e.expires_at > Instant::now());
        if disabled {
            return Ok(false);
        }
        entries.insert(
            value_key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + std::time::Duration::from_secs(ttl_seconds),
            },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_for_absent_key() {
        let store = MemoryBackend::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = MemoryBackend::new();
        store.set_with_expiry("k", "v", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let store = MemoryBackend::new();
        store.del("never-set").await.unwrap();
        store.set_with_expiry("k", "v", 60).await.unwrap();
        store.del("k").await.unwrap();
        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryBackend::new();
        store.set_with_expiry("k", "v", 1).await.unwrap();
        tokio::time::advance(std::time::Duration::from_millis(1100)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_if_enabled_rejects_while_disabled() {
        let store = MemoryBackend::new();
        store.set_with_expiry("disable:k", "1", 10).await.unwrap();
        let installed = store.put_if_enabled("disable:k", "k", "v", 60).await.unwrap();
        assert!(!installed);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_if_enabled_installs_when_absent() {
        let store = MemoryBackend::new();
        let installed = store.put_if_enabled("disable:k", "k", "v", 60).await.unwrap();
        assert!(installed);
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn shorten_expiry_millis_is_noop_on_absent_key() {
        let store = MemoryBackend::new();
        store.shorten_expiry_millis("missing", 50).await.unwrap();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shorten_expiry_millis_shortens_existing_window() {
        let store = MemoryBackend::new();
        store.set_with_expiry("disable:k", "1", 3600).await.unwrap();
        store.shorten_expiry_millis("disable:k", 100).await.unwrap();
        tokio::time::advance(std::time::Duration::from_millis(150)).await;
        assert_eq!(store.get("disable:k").await.unwrap(), None);
    }
}
