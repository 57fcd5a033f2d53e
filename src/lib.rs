//! A read-through, write-invalidating consistent cache layer sitting in
//! front of a durable record store.
//!
//! On a plain cache-aside read path, a write that lands between a reader's
//! cache miss and that reader's subsequent cache install can be clobbered
//! by stale data the reader read just before the write happened. This crate
//! closes that race with a short-lived "disable" window: a write disables
//! installs for the key before it mutates the record store, and only a
//! deferred re-enable (on an independent timeout, detached from the write's
//! own lifetime) lifts the window back open.
//!
//! The pieces:
//!
//! - [`store`] — the [`store::CacheBackend`] trait and its
//!   [`store::memory::MemoryBackend`] and [`store::redis::RedisBackend`]
//!   implementations.
//! - [`coordinator`] — [`coordinator::CacheCoordinator`], the thin
//!   key-derivation layer over a backend.
//! - [`db`] — the [`db::RecordStore`] trait and its
//!   [`db::sqlx_store::SqlxRecordStore`] implementation.
//! - [`record`] — [`record::CacheRecord`], the trait a cached, persisted
//!   type implements.
//! - [`service`] — [`service::ConsistencyService`], the `put`/`get`
//!   orchestration that ties the above together.
//! - [`config`] — [`config::ConsistencyConfig`], the TTL/jitter/timing knobs.
//! - [`error`] — the crate's error taxonomy.
//! - [`keys`] — disable-key derivation and the null-sentinel constant.

pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod keys;
pub mod record;
pub mod service;
pub mod store;

pub use config::ConsistencyConfig;
pub use coordinator::CacheCoordinator;
pub use db::RecordStore;
pub use error::{ServiceError, ServiceResult};
pub use record::CacheRecord;
pub use service::ConsistencyService;
pub use store::CacheBackend;
