//! A [`RecordStore`] backed by `sqlx`'s database-agnostic `Any` driver.
//!
//! Table and key-column names come from the record type itself
//! ([`CacheRecord::TABLE`], [`CacheRecord::KEY_COLUMN`]), and `put` is an
//! upsert built from an insert-then-update-on-unique-violation retry,
//! generalized across Postgres, MySQL, and SQLite error codes at once.
//!
//! [`CacheRecord::DATA_COLUMNS`] is descriptive metadata only: the record's
//! non-key fields are stored as one JSON-encoded `data` column rather than
//! exploded across real relational columns, since this crate has no
//! derive-macro codegen to map arbitrary structs onto arbitrary column sets.

use std::marker::PhantomData;

use sqlx::any::{AnyPool, AnyPoolOptions};
use sqlx::Row;

use crate::error::RecordStoreError;
use crate::record::CacheRecord;

use super::RecordStore;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    let Some(code) = db_err.code() else {
        return false;
    };
    matches!(
        code.as_ref(),
        // SQLite 3.37+ (prior versions used 1555)
        "2067" | "1555"
        // Postgres unique_violation
        | "23505"
        // MySQL ER_DUP_ENTRY
        | "1062"
    )
}

/// A `sqlx`-backed [`RecordStore`] for records of type `R`.
///
/// # Examples
///
/// ```no_run
/// use concache::db::sqlx_store::SqlxRecordStore;
/// use concache::record::CacheRecord;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Example { key: String, data: String }
///
/// impl CacheRecord for Example {
///     const TABLE: &'static str = "example";
///     const KEY_COLUMN: &'static str = "key";
///     const DATA_COLUMNS: &'static [&'static str] = &["data"];
///     fn key(&self) -> String { self.key.clone() }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SqlxRecordStore<Example> = SqlxRecordStore::connect("sqlite::memory:").await?;
/// store.create_table_if_not_exists().await?;
/// # Ok(())
/// # }
/// ```
pub struct SqlxRecordStore<R> {
    pool: AnyPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for SqlxRecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxRecordStore").finish_non_exhaustive()
    }
}

impl<R: CacheRecord> SqlxRecordStore<R> {
    /// Connects to `database_url` using `sqlx`'s `Any` driver.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Backend`] if the connection pool fails
    /// to establish.
    pub async fn connect(database_url: &str) -> Result<Self, RecordStoreError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new().max_connections(8).connect(database_url).await?;
        Ok(Self {
            pool,
            _record: PhantomData,
        })
    }

    /// Wraps an already-connected pool.
    #[must_use]
    pub fn from_pool(pool: AnyPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Creates the backing table if it doesn't already exist.
    ///
    /// This is a development/test convenience, not a migration system: real
    /// deployments are expected to manage schema themselves.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Backend`] if the `CREATE TABLE` fails.
    pub async fn create_table_if_not_exists(&self) -> Result<(), RecordStoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({key_column} TEXT PRIMARY KEY, data TEXT NOT NULL)",
            table = R::TABLE,
            key_column = R::KEY_COLUMN,
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R: CacheRecord> RecordStore<R> for SqlxRecordStore<R> {
    async fn put(&self, record: &R) -> Result<(), RecordStoreError> {
        let key = record.key();
        let data = record.to_cache_string()?;

        let insert_sql = format!(
            "INSERT INTO {table} ({key_column}, data) VALUES (?, ?)",
            table = R::TABLE,
            key_column = R::KEY_COLUMN,
        );
        match sqlx::query(&insert_sql).bind(&key).bind(&data).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                let update_sql = format!(
                    "UPDATE {table} SET data = ? WHERE {key_column} = ?",
                    table = R::TABLE,
                    key_column = R::KEY_COLUMN,
                );
                sqlx::query(&update_sql).bind(&data).bind(&key).execute(&self.pool).await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<R>, RecordStoreError> {
        let select_sql = format!(
            "SELECT data FROM {table} WHERE {key_column} = ?",
            table = R::TABLE,
            key_column = R::KEY_COLUMN,
        );
        let row = sqlx::query(&select_sql).bind(key).fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let data: String = row.get("data");
        let record = R::from_cache_string(&data)?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Example {
        key: String,
        data: String,
    }

    impl CacheRecord for Example {
        const TABLE: &'static str = "example";
        const KEY_COLUMN: &'static str = "key";
        const DATA_COLUMNS: &'static [&'static str] = &["data"];

        fn key(&self) -> String {
            self.key.clone()
        }
    }

    async fn make_store() -> SqlxRecordStore<Example> {
        let store: SqlxRecordStore<Example> = SqlxRecordStore::connect("sqlite::memory:").await.unwrap();
        store.create_table_if_not_exists().await.unwrap();
        store
    }

    #[tokio::test]
    async fn get_on_empty_table_is_none() {
        let store = make_store().await;
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = make_store().await;
        let record = Example {
            key: "k".into(),
            data: "v".into(),
        };
        store.put(&record).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn put_twice_upserts_rather_than_conflicting() {
        let store = make_store().await;
        store
            .put(&Example { key: "k".into(), data: "first".into() })
            .await
            .unwrap();
        store
            .put(&Example { key: "k".into(), data: "second".into() })
            .await
            .unwrap();
        let loaded = store.get("k").await.unwrap().unwrap();
        assert_eq!(loaded.data, "second");
    }
}
