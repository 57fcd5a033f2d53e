//! Cache store abstraction.
//!
//! [`CacheBackend`] is plain key-value get/set/delete/expire operations,
//! plus the one primitive that carries the correctness of the whole crate —
//! [`CacheBackend::put_if_enabled`], a single atomic, server-side
//! check-then-set across two keys.
//!
//! Implementations that cannot express a server-side atomic script (no Lua,
//! no stored procedures) must fall back to an equivalent primitive, such as
//! a conditional multi-key transaction (a `WATCH`/`MULTI`/`EXEC` pattern in
//! Redis terms). A non-atomic get-then-set is **not** a valid implementation
//! of this trait: a concurrent writer could install the disable entry in
//! the gap between the check and the set, and the install would never see it.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::StoreError;

/// An asynchronous cache store backend.
///
/// All operations key on plain `&str`; [`crate::coordinator::CacheCoordinator`]
/// is responsible for deriving the disable-entry key from the value-entry
/// key before calling into this trait.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Reads the value entry at `key`.
    ///
    /// Returns `Ok(None)` if the key is absent, represented as an `Option`
    /// rather than an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` at `key` with an expiry of `ttl_seconds`, overwriting
    /// any existing value and its expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Removes `key`. Succeeds even if `key` was already absent.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Resets the remaining TTL of `key` to `millis` milliseconds from now.
    ///
    /// If `key` is absent, this is a no-op: a "key not found" response from
    /// the backend is treated as success, not an error.
    async fn shorten_expiry_millis(&self, key: &str, millis: u64) -> Result<(), StoreError>;

    /// The atomic install primitive.
    ///
    /// In one shard-local atomic execution:
    /// 1. Reads `disable_key`. If present, returns `Ok(false)` without
    ///    touching `value_key`.
    /// 2. Otherwise writes `value` at `value_key` with a TTL of
    ///    `ttl_seconds` and returns `Ok(true)`.
    ///
    /// There must be no window between the disable-check and the value
    /// write during which another client can insert the disable entry.
    async fn put_if_enabled(
        &self,
        disable_key: &str,
        value_key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, StoreError>;
}
