//! Error types shared across the crate.
//!
//! The taxonomy mirrors the layering of the crate itself: a [`StoreError`]
//! comes out of the cache store collaborator, a [`RecordStoreError`] comes
//! out of the record store collaborator, a [`RecordError`] comes out of
//! serializing/deserializing an individual [`crate::record::CacheRecord`],
//! and a [`ServiceError`] is the only error type callers of
//! [`crate::service::ConsistencyService`] ever have to match on.
//!
//! A plain cache miss or record-store miss is deliberately *not* a variant
//! here: both are represented as `Ok(None)` at the trait level, which is the
//! idiomatic Rust shape for "absent, not an error".

use thiserror::Error;

/// Errors returned by a [`crate::store::CacheBackend`] implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Failed to check out a connection from the backend's pool.
    #[error("cache store connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The backend rejected or failed to execute a command or script.
    #[error("cache store command error: {0}")]
    Command(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The configured backend URL or options were invalid.
    #[error("invalid cache store configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by a [`crate::db::RecordStore`] implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordStoreError {
    /// The underlying database driver returned an error.
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
    /// A record failed to serialize going into, or deserialize coming out
    /// of, the record store's storage column.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Errors from serializing or deserializing a [`crate::record::CacheRecord`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// `serde_json` failed to serialize the record for cache storage.
    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
    /// `serde_json` failed to deserialize a cached payload back into a record.
    #[error("failed to deserialize record: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// The error type returned by [`crate::service::ConsistencyService`].
///
/// This is the only error type a caller of `put`/`get` needs to handle.
/// `DataNotExist` is the canonical "not found" outcome: it is returned both
/// when the record store has confirmed the key is absent and when the cache
/// holds a null-sentinel recorded by an earlier miss.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// Neither the cache nor the record store has data for this key.
    #[error("data does not exist")]
    DataNotExist,
    /// A cache store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A record store operation failed.
    #[error(transparent)]
    RecordStore(#[from] RecordStoreError),
    /// Serializing or deserializing the record failed.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Convenience alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;
