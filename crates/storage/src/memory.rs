//! In-process storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{check_expected_version, StoredRecord};
use crate::traits::KeyValueStorage;

/// Volatile storage backed by a `HashMap`. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, payload: String) -> Result<i64, StorageError> {
        let mut records = self.records.write().await;
        let record = StoredRecord::next(key, payload, records.get(key))?;
        let version = record.version;
        records.insert(key.to_string(), record);
        Ok(version)
    }

    async fn put_versioned(
        &self,
        key: &str,
        expected_version: Option<i64>,
        payload: String,
    ) -> Result<i64, StorageError> {
        let mut records = self.records.write().await;
        check_expected_version(key, expected_version, records.get(key))?;
        let record = StoredRecord::next(key, payload, records.get(key))?;
        let version = record.version;
        records.insert(key.to_string(), record);
        Ok(version)
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .records
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[tokio::test]
    async fn memory_conformance() {
        let report = run_conformance_suite(|| async { MemoryStorage::new() }).await;
        assert!(report.failed == 0, "{report}");
        assert!(report.total > 0);
    }

    #[tokio::test]
    async fn len_tracks_distinct_keys() {
        let s = MemoryStorage::new();
        assert!(s.is_empty().await);
        s.put("a", "1".to_string()).await.unwrap();
        s.put("a", "2".to_string()).await.unwrap();
        s.put("b", "3".to_string()).await.unwrap();
        assert_eq!(s.len().await, 2);
    }
}
