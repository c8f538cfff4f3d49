/// All errors that can be returned by a `KeyValueStorage` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Optimistic concurrency conflict: the record's version is no longer
    /// the one the writer read.
    #[error("concurrent conflict on {key}: expected version {expected_version}, found {actual_version}")]
    ConcurrentConflict {
        key: String,
        expected_version: i64,
        actual_version: i64,
    },

    /// A versioned write expected an existing record but none was stored.
    #[error("record not found: {key}")]
    NotFound { key: String },

    /// A versioned create found a record already stored under the key.
    #[error("record already exists: {key}")]
    AlreadyExists { key: String },

    /// The key cannot be represented by this backend.
    #[error("invalid key: {key:?}")]
    InvalidKey { key: String },

    /// Filesystem error from a file-backed store.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend-specific storage error (serialization, clock, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
