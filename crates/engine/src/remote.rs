//! Remote profile store abstraction.
//!
//! When a signed-in session exists, the numeric account fields live in a
//! remote `profiles` record. The core only needs fetch/create/update by user
//! id; [`StorageProfileClient`] provides that over any key-value backend.

use std::sync::Arc;

use async_trait::async_trait;
use ecoquest_core::{level_for_points, ImpactDelta, ImpactTotals};
use ecoquest_storage::{KeyValueStorage, StorageError};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No profile exists for the user.
    #[error("profile not found for user {user_id}")]
    ProfileNotFound { user_id: String },

    /// The session has no remote profile to update (fetch/create failed).
    #[error("no remote profile loaded")]
    NoProfile,

    /// The remote record changed between read and write.
    #[error("profile for user {user_id} was modified concurrently")]
    Conflict { user_id: String },

    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for RemoteError {
    fn from(e: StorageError) -> Self {
        RemoteError::Unavailable(e.to_string())
    }
}

// ──────────────────────────────────────────────
// Records
// ──────────────────────────────────────────────

/// Remote profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub student_number: String,
    pub points: u64,
    pub level: u32,
    pub streak_count: u32,
    pub total_co2_saved: u64,
    pub total_water_saved: u64,
    pub total_energy_saved: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    pub fn impact(&self) -> ImpactTotals {
        ImpactTotals {
            co2_saved: self.total_co2_saved,
            water_saved: self.total_water_saved,
            energy_saved: self.total_energy_saved,
        }
    }
}

/// Partial update; `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub points: Option<u64>,
    pub level: Option<u32>,
    pub streak_count: Option<u32>,
    pub total_co2_saved: Option<u64>,
    pub total_water_saved: Option<u64>,
    pub total_energy_saved: Option<u64>,
}

impl ProfileUpdate {
    /// Update adding `points` to `current`, with the level recomputed.
    pub fn add_points(current: &Profile, points: u64) -> Self {
        let total = current.points.saturating_add(points);
        ProfileUpdate {
            points: Some(total),
            level: Some(level_for_points(total)),
            ..Default::default()
        }
    }

    /// Update adding the non-zero fields of `delta` to `current`.
    pub fn add_impact(current: &Profile, delta: &ImpactDelta) -> Self {
        let bump = |base: u64, add: Option<u64>| {
            add.filter(|v| *v > 0).map(|v| base.saturating_add(v))
        };
        ProfileUpdate {
            total_co2_saved: bump(current.total_co2_saved, delta.co2_saved),
            total_water_saved: bump(current.total_water_saved, delta.water_saved),
            total_energy_saved: bump(current.total_energy_saved, delta.energy_saved),
            ..Default::default()
        }
    }

    fn apply(&self, profile: &mut Profile) {
        if let Some(v) = self.points {
            profile.points = v;
        }
        if let Some(v) = self.level {
            profile.level = v;
        }
        if let Some(v) = self.streak_count {
            profile.streak_count = v;
        }
        if let Some(v) = self.total_co2_saved {
            profile.total_co2_saved = v;
        }
        if let Some(v) = self.total_water_saved {
            profile.total_water_saved = v;
        }
        if let Some(v) = self.total_energy_saved {
            profile.total_energy_saved = v;
        }
    }
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Query/update API of the remote profile store.
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Fetch a profile. `Ok(None)` when the user has none yet.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError>;

    /// Create a zeroed profile at level 1.
    async fn create_profile(
        &self,
        user_id: &str,
        student_number: &str,
    ) -> Result<Profile, RemoteError>;

    /// Apply a partial update and return the stored profile.
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, RemoteError>;
}

// ──────────────────────────────────────────────
// StorageProfileClient
// ──────────────────────────────────────────────

/// Profile store kept in a [`KeyValueStorage`], one record per user.
///
/// Updates are compare-and-swap writes against the version read, so two
/// writers racing on the same profile get `RemoteError::Conflict` instead of
/// silently losing an update.
pub struct StorageProfileClient {
    storage: Arc<dyn KeyValueStorage>,
}

impl StorageProfileClient {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    fn key(user_id: &str) -> String {
        format!("profile-{user_id}")
    }

    fn decode(payload: &str) -> Result<Profile, RemoteError> {
        serde_json::from_str(payload)
            .map_err(|e| RemoteError::Unavailable(format!("corrupt profile record: {e}")))
    }

    fn encode(profile: &Profile) -> Result<String, RemoteError> {
        serde_json::to_string(profile)
            .map_err(|e| RemoteError::Unavailable(format!("serialize profile: {e}")))
    }
}

fn now() -> Result<String, RemoteError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| RemoteError::Unavailable(format!("timestamp: {e}")))
}

#[async_trait]
impl ProfileClient for StorageProfileClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError> {
        match self.storage.get(&Self::key(user_id)).await? {
            Some(record) => Self::decode(&record.payload).map(Some),
            None => Ok(None),
        }
    }

    async fn create_profile(
        &self,
        user_id: &str,
        student_number: &str,
    ) -> Result<Profile, RemoteError> {
        let ts = now()?;
        let profile = Profile {
            id: user_id.to_string(),
            student_number: student_number.to_string(),
            points: 0,
            level: 1,
            streak_count: 0,
            total_co2_saved: 0,
            total_water_saved: 0,
            total_energy_saved: 0,
            created_at: ts.clone(),
            updated_at: ts,
        };
        match self
            .storage
            .put_versioned(&Self::key(user_id), None, Self::encode(&profile)?)
            .await
        {
            Ok(_) => Ok(profile),
            Err(StorageError::AlreadyExists { .. }) => Err(RemoteError::Conflict {
                user_id: user_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, RemoteError> {
        let key = Self::key(user_id);
        let record = self
            .storage
            .get(&key)
            .await?
            .ok_or_else(|| RemoteError::ProfileNotFound {
                user_id: user_id.to_string(),
            })?;
        let mut profile = Self::decode(&record.payload)?;
        update.apply(&mut profile);
        profile.updated_at = now()?;

        match self
            .storage
            .put_versioned(&key, Some(record.version), Self::encode(&profile)?)
            .await
        {
            Ok(_) => Ok(profile),
            Err(StorageError::ConcurrentConflict { .. }) | Err(StorageError::NotFound { .. }) => {
                Err(RemoteError::Conflict {
                    user_id: user_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoquest_storage::MemoryStorage;

    fn client() -> StorageProfileClient {
        StorageProfileClient::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn fetch_missing_is_none() {
        assert!(client().fetch_profile("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let c = client();
        let created = c.create_profile("u1", "s123@uni.example").await.unwrap();
        assert_eq!(created.level, 1);
        assert_eq!(created.points, 0);
        let fetched = c.fetch_profile("u1").await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let c = client();
        c.create_profile("u1", "").await.unwrap();
        assert!(matches!(
            c.create_profile("u1", "").await,
            Err(RemoteError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let c = client();
        let p = c.create_profile("u1", "s1").await.unwrap();
        let p = c
            .update_profile("u1", &ProfileUpdate::add_points(&p, 1030))
            .await
            .unwrap();
        assert_eq!(p.points, 1030);
        assert_eq!(p.level, 2);

        let delta = ImpactDelta {
            water_saved: Some(40),
            co2_saved: Some(0),
            energy_saved: None,
        };
        let update = ProfileUpdate::add_impact(&p, &delta);
        assert_eq!(update.total_co2_saved, None);
        let p = c.update_profile("u1", &update).await.unwrap();
        assert_eq!(p.total_water_saved, 40);
        assert_eq!(p.points, 1030);
    }

    #[tokio::test]
    async fn update_missing_profile_not_found() {
        assert!(matches!(
            client()
                .update_profile("ghost", &ProfileUpdate::default())
                .await,
            Err(RemoteError::ProfileNotFound { .. })
        ));
    }
}
