use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StorageError;

/// A stored value with its version stamp.
///
/// `payload` is opaque to the storage layer; callers serialize their own
/// records into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: String,
    pub payload: String,
    /// 0 on first write, incremented by one on every later write.
    pub version: i64,
    /// RFC 3339 timestamp string of the last write.
    pub updated_at: String,
}

impl StoredRecord {
    /// Build the record for a write following `previous` (if any).
    pub(crate) fn next(
        key: &str,
        payload: String,
        previous: Option<&StoredRecord>,
    ) -> Result<Self, StorageError> {
        Ok(StoredRecord {
            key: key.to_string(),
            payload,
            version: previous.map_or(0, |p| p.version + 1),
            updated_at: now_rfc3339()?,
        })
    }
}

pub(crate) fn now_rfc3339() -> Result<String, StorageError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StorageError::Backend(format!("timestamp format: {e}")))
}

/// Compare-and-swap precondition shared by the backends.
///
/// `expected = None` means the key must be absent; `Some(v)` means the stored
/// record must be at version `v`.
pub(crate) fn check_expected_version(
    key: &str,
    expected: Option<i64>,
    current: Option<&StoredRecord>,
) -> Result<(), StorageError> {
    match (expected, current) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(StorageError::AlreadyExists {
            key: key.to_string(),
        }),
        (Some(_), None) => Err(StorageError::NotFound {
            key: key.to_string(),
        }),
        (Some(v), Some(rec)) if rec.version == v => Ok(()),
        (Some(v), Some(rec)) => Err(StorageError::ConcurrentConflict {
            key: key.to_string(),
            expected_version: v,
            actual_version: rec.version,
        }),
    }
}
