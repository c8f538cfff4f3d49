//! Error types for the progression core.
//!
//! Each component reports its own error enum; [`EngineError`] is the flat
//! set of kinds the session surfaces to callers.

use ecoquest_core::ProofKind;
use ecoquest_storage::StorageError;

use crate::config::ConfigError;
use crate::remote::RemoteError;

/// Precondition failures from the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("task '{task_id}' not found in challenge '{challenge_id}'")]
    TaskNotFound {
        challenge_id: String,
        task_id: String,
    },
    #[error("task '{task_id}' is locked (day {day_number})")]
    TaskLocked { task_id: String, day_number: u32 },
    #[error("task '{task_id}' is already completed")]
    AlreadyCompleted { task_id: String },
}

/// Proof validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("task '{task_id}' requires {kind} proof")]
    MissingData { task_id: String, kind: ProofKind },
}

/// Every error kind the session can report.
///
/// Validation kinds (`TaskLocked`, `AlreadyCompleted`, `MissingProofData`)
/// reject the action without touching state. `PersistenceUnavailable` and
/// `RemoteUpdateFailed` are also returned as warnings next to a successful
/// completion, since the in-memory state stays usable.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown challenge: {challenge_id}")]
    UnknownChallenge { challenge_id: String },

    #[error("task '{task_id}' not found in challenge '{challenge_id}'")]
    TaskNotFound {
        challenge_id: String,
        task_id: String,
    },

    #[error("task '{task_id}' is locked (day {day_number})")]
    TaskLocked { task_id: String, day_number: u32 },

    #[error("task '{task_id}' is already completed")]
    AlreadyCompleted { task_id: String },

    #[error("task '{task_id}' requires {kind} proof")]
    MissingProofData { task_id: String, kind: ProofKind },

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[source] StorageError),

    #[error("remote update failed: {0}")]
    RemoteUpdateFailed(#[source] RemoteError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Rejections caused by the user's action rather than infrastructure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::TaskNotFound { .. }
                | EngineError::TaskLocked { .. }
                | EngineError::AlreadyCompleted { .. }
                | EngineError::MissingProofData { .. }
        )
    }
}

impl From<ProgressionError> for EngineError {
    fn from(e: ProgressionError) -> Self {
        match e {
            ProgressionError::TaskNotFound {
                challenge_id,
                task_id,
            } => EngineError::TaskNotFound {
                challenge_id,
                task_id,
            },
            ProgressionError::TaskLocked {
                task_id,
                day_number,
            } => EngineError::TaskLocked {
                task_id,
                day_number,
            },
            ProgressionError::AlreadyCompleted { task_id } => {
                EngineError::AlreadyCompleted { task_id }
            }
        }
    }
}

impl From<ProofError> for EngineError {
    fn from(e: ProofError) -> Self {
        match e {
            ProofError::MissingData { task_id, kind } => {
                EngineError::MissingProofData { task_id, kind }
            }
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        EngineError::PersistenceUnavailable(e)
    }
}

impl From<RemoteError> for EngineError {
    fn from(e: RemoteError) -> Self {
        EngineError::RemoteUpdateFailed(e)
    }
}
