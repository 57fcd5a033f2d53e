//! The object contract: the capability set a domain record exposes so that
//! [`crate::service::ConsistencyService`] can cache and persist it without
//! knowing its concrete shape.
//!
//! A record exposes a table name, a key-column name, a key value, the
//! data-column names, and a pair of serialize/deserialize methods. It's
//! expressed here as a plain trait rather than a derive-macro-backed ORM
//! model — the latter is out of scope for this crate (see `DESIGN.md`).

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::RecordError;

/// A domain record that can be cached and persisted by key.
///
/// Implementors are typically `#[derive(Serialize, Deserialize)]` structs
/// with a blanket impl of [`to_cache_string`](CacheRecord::to_cache_string)
/// and [`from_cache_string`](CacheRecord::from_cache_string) via JSON, and a
/// hand-written [`key`](CacheRecord::key) that returns the primary key value.
///
/// # Examples
///
/// ```
/// use concache::record::CacheRecord;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Example {
///     key: String,
///     data: String,
/// }
///
/// impl CacheRecord for Example {
///     const TABLE: &'static str = "example";
///     const KEY_COLUMN: &'static str = "key";
///     const DATA_COLUMNS: &'static [&'static str] = &["data"];
///
///     fn key(&self) -> String {
///         self.key.clone()
///     }
/// }
///
/// let example = Example { key: "k".into(), data: "v".into() };
/// let encoded = example.to_cache_string().unwrap();
/// let decoded = Example::from_cache_string(&encoded).unwrap();
/// assert_eq!(decoded.data, "v");
/// ```
pub trait CacheRecord: Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    /// The record store table (or collection) this record is persisted in.
    const TABLE: &'static str;
    /// The name of the primary-key column.
    const KEY_COLUMN: &'static str;
    /// The names of the non-key columns persisted alongside the key.
    const DATA_COLUMNS: &'static [&'static str];

    /// The primary key value for this record instance.
    fn key(&self) -> String;

    /// Serializes this record to the string stored as the cache's value
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Serialize`] if JSON encoding fails.
    fn to_cache_string(&self) -> Result<String, RecordError> {
        serde_json::to_string(self).map_err(RecordError::Serialize)
    }

    /// Deserializes a record previously produced by
    /// [`to_cache_string`](CacheRecord::to_cache_string).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Deserialize`] if JSON decoding fails.
    fn from_cache_string(body: &str) -> Result<Self, RecordError> {
        serde_json::from_str(body).map_err(RecordError::Deserialize)
    }
}
