use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::StoredRecord;

/// Durable key-value storage for serialized progress and account records.
///
/// Every write produces a new version stamp: 0 for the first write of a key,
/// then +1 per write. Removing a key forgets its history, so a later write
/// starts again at 0.
///
/// ## Write modes
///
/// - `put` is a blind overwrite (last write wins).
/// - `put_versioned` is a compare-and-swap against the version the writer
///   last read. A mismatch returns `StorageError::ConcurrentConflict` and
///   leaves the stored record untouched.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so a store can be shared
/// behind an `Arc` across async tasks (the deferred unlock task included).
#[async_trait]
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Read the record stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StorageError>;

    /// Overwrite `key` unconditionally. Returns the new version.
    async fn put(&self, key: &str, payload: String) -> Result<i64, StorageError>;

    /// Write `key` only if its current version matches `expected_version`
    /// (`None` = key must not exist). Returns the new version.
    async fn put_versioned(
        &self,
        key: &str,
        expected_version: Option<i64>,
        payload: String,
    ) -> Result<i64, StorageError>;

    /// Delete `key`. Returns whether a record was present.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// All stored keys starting with `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

#[async_trait]
impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, payload: String) -> Result<i64, StorageError> {
        (**self).put(key, payload).await
    }

    async fn put_versioned(
        &self,
        key: &str,
        expected_version: Option<i64>,
        payload: String,
    ) -> Result<i64, StorageError> {
        (**self).put_versioned(key, expected_version, payload).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_keys(prefix).await
    }
}
