//! Directory-backed storage: one JSON file per key.
//!
//! Keys are escaped into file names (`[A-Za-z0-9_-]` kept, every other byte
//! written as `%XX`). Writes go to a temporary file first and are renamed into
//! place, so a crash mid-write leaves the previous record intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::record::{check_expected_version, StoredRecord};
use crate::traits::KeyValueStorage;

const RECORD_EXT: &str = "json";

#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    /// Serialises read-modify-write cycles so version stamps stay monotonic.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(FileStorage {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self
            .root
            .join(format!("{}.{}", encode_key(key), RECORD_EXT)))
    }

    async fn read_record(&self, key: &str) -> Result<Option<StoredRecord>, StorageError> {
        let path = self.path_for(key)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Backend(format!("corrupt record {}: {e}", path.display())))
    }

    async fn write_record(&self, record: &StoredRecord) -> Result<(), StorageError> {
        let path = self.path_for(&record.key)?;
        let tmp = path.with_extension("tmp");
        let body = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::Backend(format!("serialize record: {e}")))?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(key = %record.key, version = record.version, "record written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StorageError> {
        self.read_record(key).await
    }

    async fn put(&self, key: &str, payload: String) -> Result<i64, StorageError> {
        let _guard = self.write_lock.lock().await;
        // A corrupt previous record is overwritten rather than blocking the write.
        let previous = match self.read_record(key).await {
            Ok(previous) => previous,
            Err(StorageError::Backend(reason)) => {
                tracing::warn!(%key, %reason, "overwriting corrupt record");
                None
            }
            Err(e) => return Err(e),
        };
        let record = StoredRecord::next(key, payload, previous.as_ref())?;
        self.write_record(&record).await?;
        Ok(record.version)
    }

    async fn put_versioned(
        &self,
        key: &str,
        expected_version: Option<i64>,
        payload: String,
    ) -> Result<i64, StorageError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.read_record(key).await?;
        check_expected_version(key, expected_version, previous.as_ref())?;
        let record = StoredRecord::next(key, payload, previous.as_ref())?;
        self.write_record(&record).await?;
        Ok(record.version)
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
