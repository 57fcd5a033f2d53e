//! Record store abstraction — the durable side of the cache.
//!
//! [`RecordStore`] is deliberately narrow: `put` (upsert by primary key) and
//! `get` (lookup by primary key, `Ok(None)` on miss). Anything else a real
//! application needs from its database belongs outside this crate.

pub mod sqlx_store;

use async_trait::async_trait;

use crate::error::RecordStoreError;
use crate::record::CacheRecord;

/// A durable record store keyed by a [`CacheRecord`]'s primary key.
#[async_trait]
pub trait RecordStore<R: CacheRecord>: Send + Sync + 'static {
    /// Upserts `record` by its primary key.
    async fn put(&self, record: &R) -> Result<(), RecordStoreError>;

    /// Looks up a record by primary key value.
    ///
    /// Returns `Ok(None)` when absent, represented as an `Option` rather
    /// than an error.
    async fn get(&self, key: &str) -> Result<Option<R>, RecordStoreError>;
}
