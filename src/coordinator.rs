//! The cache coordinator: get/del/disable/enable/put_if_enabled, layered
//! over a [`CacheBackend`] and the key-derivation rules in [`crate::keys`].
//!
//! [`crate::service::ConsistencyService`] is the only caller; the
//! coordinator itself holds no policy (TTLs, jitter) — those are passed in
//! by the caller on each call.

use std::sync::Arc;

use tracing::trace;

use crate::error::StoreError;
use crate::keys::disable_key;
use crate::store::CacheBackend;

/// Wraps a [`CacheBackend`] with the key-derivation and naming conventions
/// the consistency protocol depends on.
#[derive(Clone)]
pub struct CacheCoordinator {
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheCoordinator").finish_non_exhaustive()
    }
}

impl CacheCoordinator {
    /// Wraps `backend` in a new coordinator.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Fetches the value entry for `key`. No side effects.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.backend.get(key).await
    }

    /// Removes the value entry for `key`. Idempotent.
    pub async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.backend.del(key).await
    }

    /// Unconditionally (re)writes the disable entry for `key` with a TTL of
    /// `window_seconds`, overwriting any prior disable entry so a late
    /// writer can extend the window rather than being capped by an earlier
    /// one.
    pub async fn disable(&self, key: &str, window_seconds: u64) -> Result<(), StoreError> {
        trace!(key, window_seconds, "disabling write-through cache install");
        self.backend
            .set_with_expiry(&disable_key(key), "1", window_seconds)
            .await
    }

    /// Shortens the remaining TTL of the disable entry for `key` to
    /// `delay_millis` milliseconds. A no-op if the disable entry is already
    /// absent.
    pub async fn enable(&self, key: &str, delay_millis: u64) -> Result<(), StoreError> {
        trace!(key, delay_millis, "re-enabling write-through cache install");
        self.backend
            .shorten_expiry_millis(&disable_key(key), delay_millis)
            .await
    }

    /// The atomic install primitive: installs `value` at `key` with TTL
    /// `value_ttl_seconds` only if the disable entry for `key` is absent.
    /// Returns whether the install happened.
    pub async fn put_if_enabled(
        &self,
        key: &str,
        value: &str,
        value_ttl_seconds: u64,
    ) -> Result<bool, StoreError> {
        self.backend
            .put_if_enabled(&disable_key(key), key, value, value_ttl_seconds)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;

    fn coordinator() -> CacheCoordinator {
        CacheCoordinator::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn disable_blocks_put_if_enabled() {
        let c = coordinator();
        c.disable("k", 10).await.unwrap();
        let installed = c.put_if_enabled("k", "v", 60).await.unwrap();
        assert!(!installed);
        assert_eq!(c.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn repeated_disable_extends_window() {
        let c = coordinator();
        c.disable("k", 1).await.unwrap();
        c.disable("k", 100).await.unwrap();
        // still disabled well past the first window's original length
        let installed = c.put_if_enabled("k", "v", 60).await.unwrap();
        assert!(!installed);
    }

    #[tokio::test(start_paused = true)]
    async fn enable_shortens_window_and_unblocks() {
        let c = coordinator();
        c.disable("k", 3600).await.unwrap();
        c.enable("k", 50).await.unwrap();
        tokio::time::advance(std::time::Duration::from_millis(100)).await;
        let installed = c.put_if_enabled("k", "v", 60).await.unwrap();
        assert!(installed);
    }

    #[tokio::test]
    async fn enable_on_absent_disable_entry_is_noop() {
        let c = coordinator();
        c.enable("k", 50).await.unwrap();
        let installed = c.put_if_enabled("k", "v", 60).await.unwrap();
        assert!(installed);
    }

    #[tokio::test]
    async fn del_on_absent_key_succeeds() {
        let c = coordinator();
        c.del("never-written").await.unwrap();
    }
}
