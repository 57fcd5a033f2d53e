//! The consistency service: orchestrates `put`/`get` against the
//! [`CacheCoordinator`] and a [`RecordStore`], implementing the read-through,
//! write-invalidating ordering and timing policy the whole crate exists for.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use concache::config::ConsistencyConfig;
//! use concache::coordinator::CacheCoordinator;
//! use concache::db::sqlx_store::SqlxRecordStore;
//! use concache::record::CacheRecord;
//! use concache::service::ConsistencyService;
//! use concache::store::memory::MemoryBackend;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Example {
//!     key: String,
//!     data: String,
//! }
//!
//! impl CacheRecord for Example {
//!     const TABLE: &'static str = "example";
//!     const KEY_COLUMN: &'static str = "key";
//!     const DATA_COLUMNS: &'static [&'static str] = &["data"];
//!     fn key(&self) -> String {
//!         self.key.clone()
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = CacheCoordinator::new(Arc::new(MemoryBackend::new()));
//! let db: SqlxRecordStore<Example> = SqlxRecordStore::connect("sqlite::memory:").await?;
//! db.create_table_if_not_exists().await?;
//!
//! let service = ConsistencyService::new(coordinator, Arc::new(db), ConsistencyConfig::default());
//!
//! service.put(&Example { key: "k".into(), data: "v".into() }).await?;
//! let (used_cache, record) = service.get("k").await;
//! assert!(!used_cache);
//! assert_eq!(record?.data, "v");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::ConsistencyConfig;
use crate::coordinator::CacheCoordinator;
use crate::db::RecordStore;
use crate::error::{ServiceError, ServiceResult};
use crate::keys::NULL_SENTINEL;
use crate::record::CacheRecord;

/// The independent timeout applied to the deferred re-enable task spawned
/// by [`ConsistencyService::put`]. Deliberately detached from the caller's
/// own cancellation: a cancelled `put` must still unblock writes in bounded
/// time.
const DEFERRED_ENABLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Orchestrates the read-through, write-invalidating consistency protocol
/// for a single record type `R`.
pub struct ConsistencyService<R: CacheRecord> {
    coordinator: CacheCoordinator,
    record_store: Arc<dyn RecordStore<R>>,
    config: ConsistencyConfig,
}

impl<R: CacheRecord> std::fmt::Debug for ConsistencyService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: CacheRecord> ConsistencyService<R> {
    /// Builds a new service over `coordinator` and `record_store`, governed
    /// by `config`.
    #[must_use]
    pub fn new(coordinator: CacheCoordinator, record_store: Arc<dyn RecordStore<R>>, config: ConsistencyConfig) -> Self {
        Self {
            coordinator,
            record_store,
            config,
        }
    }

    /// Writes `record`, executing strictly in order: disable, schedule a
    /// deferred re-enable, delete the cached value, then persist to the
    /// record store.
    ///
    /// Disabling *before* deleting closes the hazard where a concurrent
    /// reader's `put_if_enabled` races the delete: once `Disable` has run,
    /// any reader's install attempt — no matter when its database read
    /// happened — is rejected until the deferred re-enable fires.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if disabling or deleting the cache
    /// entry fails, or [`ServiceError::RecordStore`] if the record store
    /// write fails. In both cases the deferred re-enable task still fires;
    /// only the disable-window TTL is relied on for eventual unblocking
    /// once re-enable itself fails too.
    pub async fn put(&self, record: &R) -> ServiceResult<()> {
        let key = record.key();

        self.coordinator
            .disable(&key, self.config.disable_expire_seconds)
            .await
            .map_err(ServiceError::from)?;

        self.schedule_deferred_enable(key.clone());

        self.coordinator.del(&key).await.map_err(ServiceError::from)?;

        self.record_store.put(record).await.map_err(ServiceError::from)?;

        Ok(())
    }

    /// Reads the record for `key`, trying the cache first and falling
    /// through to the record store on a miss.
    ///
    /// Returns `(used_cache, result)`. `used_cache` is `true` only when the
    /// data came from the cache (including the null-sentinel path);
    /// best-effort cache installs on the miss path never flip it to `true`.
    pub async fn get(&self, key: &str) -> (bool, ServiceResult<R>) {
        match self.coordinator.get(key).await {
            Ok(Some(cached)) if cached == NULL_SENTINEL => return (true, Err(ServiceError::DataNotExist)),
            Ok(Some(cached)) => {
                let result = R::from_cache_string(&cached).map_err(ServiceError::from);
                return (true, result);
            }
            Ok(None) => {}
            Err(err) => return (false, Err(err.into())),
        }

        match self.record_store.get(key).await {
            Ok(None) => {
                self.best_effort_install(key, NULL_SENTINEL).await;
                (false, Err(ServiceError::DataNotExist))
            }
            Ok(Some(record)) => match record.to_cache_string() {
                Ok(serialized) => {
                    self.best_effort_install(key, &serialized).await;
                    (false, Ok(record))
                }
                // Unlike a failed best-effort install itself, a failure to
                // serialize the record in the first place is fatal to this
                // call: the record was already fetched from the record
                // store, but the caller must treat a non-nil error here as
                // authoritative and not trust the returned record.
                Err(err) => (false, Err(err.into())),
            },
            Err(err) => (false, Err(err.into())),
        }
    }

    async fn best_effort_install(&self, key: &str, value: &str) {
        let ttl = self.config.effective_cache_expire_seconds();
        match self.coordinator.put_if_enabled(key, value, ttl).await {
            Ok(installed) => tracing::debug!(key, installed, "best-effort cache install"),
            Err(err) => warn!(key, error = %err, "best-effort cache install failed"),
        }
    }

    fn schedule_deferred_enable(&self, key: String) {
        let coordinator = self.coordinator.clone();
        let delay_millis = self.config.enable_delay_millis;
        tokio::spawn(async move {
            let enable = coordinator.enable(&key, delay_millis);
            match tokio::time::timeout(DEFERRED_ENABLE_TIMEOUT, enable).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(key, error = %err, "deferred re-enable failed"),
                Err(_elapsed) => warn!(key, "deferred re-enable timed out"),
            }
        });
    }
}
