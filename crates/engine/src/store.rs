//! Progress store: per-challenge progress records over key-value storage.

use std::sync::Arc;

use ecoquest_core::{catalog, ChallengeProgress};
use ecoquest_storage::{KeyValueStorage, StorageError};

const PROGRESS_PREFIX: &str = "challenge-";
const PROGRESS_SUFFIX: &str = "-progress";

/// Storage key for a challenge's progress record.
pub fn progress_key(challenge_id: &str) -> String {
    format!("{PROGRESS_PREFIX}{challenge_id}{PROGRESS_SUFFIX}")
}

/// Loads and saves [`ChallengeProgress`] records.
///
/// Saves are blind overwrites (last write wins). Loads never fail: a missing,
/// unreadable or malformed record yields fresh progress from the catalog.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub async fn load(&self, challenge_id: &str) -> ChallengeProgress {
        let key = progress_key(challenge_id);
        let record = match self.storage.get(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => return fresh(challenge_id),
            Err(e) => {
                tracing::warn!(%challenge_id, error = %e, "progress read failed, starting fresh");
                return fresh(challenge_id);
            }
        };
        match serde_json::from_str::<ChallengeProgress>(&record.payload) {
            Ok(progress) if is_usable(challenge_id, &progress) => progress,
            Ok(_) => {
                tracing::warn!(%challenge_id, "stored progress does not match catalog, starting fresh");
                fresh(challenge_id)
            }
            Err(e) => {
                tracing::warn!(%challenge_id, error = %e, "malformed progress record, starting fresh");
                fresh(challenge_id)
            }
        }
    }

    /// Persist the full record, replacing whatever was stored.
    pub async fn save(&self, progress: &ChallengeProgress) -> Result<(), StorageError> {
        let payload = serde_json::to_string(progress)
            .map_err(|e| StorageError::Backend(format!("serialize progress: {e}")))?;
        let version = self
            .storage
            .put(&progress_key(&progress.challenge_id), payload)
            .await?;
        tracing::debug!(challenge_id = %progress.challenge_id, version, "progress saved");
        Ok(())
    }

    /// Forget stored progress for a challenge.
    pub async fn clear(&self, challenge_id: &str) -> Result<bool, StorageError> {
        self.storage.remove(&progress_key(challenge_id)).await
    }

    /// Forget every stored progress record, including ones for challenges
    /// no longer in the catalog. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in self.storage.list_keys(PROGRESS_PREFIX).await? {
            if key.ends_with(PROGRESS_SUFFIX) && self.storage.remove(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn fresh(challenge_id: &str) -> ChallengeProgress {
    ChallengeProgress::fresh(challenge_id, catalog::tasks_for(challenge_id))
}

/// A stored record is only trusted if it belongs to this challenge, carries
/// the catalog's task ids in order, and has a day counter in range.
fn is_usable(challenge_id: &str, progress: &ChallengeProgress) -> bool {
    let catalog_tasks = catalog::tasks_for(challenge_id);
    progress.challenge_id == challenge_id
        && progress.tasks.len() == catalog_tasks.len()
        && progress
            .tasks
            .iter()
            .zip(&catalog_tasks)
            .all(|(a, b)| a.id == b.id && a.day_number == b.day_number)
        && (catalog_tasks.is_empty()
            || (1..=catalog_tasks.len() as u32).contains(&progress.current_day))
}
