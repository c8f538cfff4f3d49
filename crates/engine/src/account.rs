//! Account ledger with dual-mode persistence.
//!
//! The backend is chosen once at session start:
//!
//! - [`AccountBackend::LocalBacked`]: the whole account lives in one local
//!   record under [`ACCOUNT_KEY`].
//! - [`AccountBackend::RemoteBacked`]: numeric totals (points, level, streak,
//!   impact) come from the remote profile; membership sets (active,
//!   completed, badges) stay local. Every numeric change is also applied to
//!   the local record, which is what the account falls back to when the
//!   remote profile could not be loaded.
//!
//! Membership changes are in-memory until [`AccountBackend::flush`].

use std::sync::Arc;

use ecoquest_core::{ChallengeStatus, ImpactDelta, UserAccount};
use ecoquest_storage::KeyValueStorage;

use crate::error::EngineError;
use crate::remote::{Profile, ProfileClient, ProfileUpdate, RemoteError};

/// Storage key of the local account record.
pub const ACCOUNT_KEY: &str = "ecoquest-user-data";

// ──────────────────────────────────────────────
// Local ledger
// ──────────────────────────────────────────────

pub struct LocalAccount {
    storage: Arc<dyn KeyValueStorage>,
    account: UserAccount,
}

impl LocalAccount {
    /// Load the stored account. A missing, unreadable or malformed record
    /// yields the default account.
    pub async fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let account = match storage.get(ACCOUNT_KEY).await {
            Ok(Some(record)) => serde_json::from_str(&record.payload).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "malformed account record, using defaults");
                UserAccount::default()
            }),
            Ok(None) => UserAccount::default(),
            Err(e) => {
                tracing::warn!(error = %e, "account read failed, using defaults");
                UserAccount::default()
            }
        };
        Self { storage, account }
    }

    pub fn account(&self) -> &UserAccount {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut UserAccount {
        &mut self.account
    }

    pub async fn persist(&self) -> Result<(), EngineError> {
        let payload = serde_json::to_string(&self.account).map_err(|e| {
            EngineError::PersistenceUnavailable(ecoquest_storage::StorageError::Backend(format!(
                "serialize account: {e}"
            )))
        })?;
        self.storage.put(ACCOUNT_KEY, payload).await?;
        Ok(())
    }

    /// Restore defaults and drop the stored record.
    pub async fn reset(&mut self) -> Result<(), EngineError> {
        self.account = UserAccount::default();
        self.storage.remove(ACCOUNT_KEY).await?;
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Remote ledger
// ──────────────────────────────────────────────

pub struct RemoteAccount {
    client: Arc<dyn ProfileClient>,
    user_id: String,
    profile: Option<Profile>,
    local: LocalAccount,
}

impl RemoteAccount {
    /// Fetch the user's profile, creating it when absent.
    ///
    /// On failure the ledger is still returned, without a profile, together
    /// with the error so the caller can surface it.
    pub async fn connect(
        client: Arc<dyn ProfileClient>,
        user_id: &str,
        student_number: &str,
        local: LocalAccount,
    ) -> (Self, Option<EngineError>) {
        let fetched = match client.fetch_profile(user_id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                tracing::info!(%user_id, "no remote profile, creating one");
                client.create_profile(user_id, student_number).await
            }
            Err(e) => Err(e),
        };
        let (profile, warning) = match fetched {
            Ok(profile) => (Some(profile), None),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "remote profile unavailable, using local totals");
                (None, Some(EngineError::RemoteUpdateFailed(e)))
            }
        };
        let ledger = Self {
            client,
            user_id: user_id.to_string(),
            profile,
            local,
        };
        (ledger, warning)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    async fn push(&mut self, update: ProfileUpdate) -> Result<(), EngineError> {
        match self.client.update_profile(&self.user_id, &update).await {
            Ok(profile) => {
                self.profile = Some(profile);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "remote profile update failed");
                Err(EngineError::RemoteUpdateFailed(e))
            }
        }
    }

    /// Membership from the local record, numeric totals from the profile.
    fn merged(&self) -> UserAccount {
        let mut account = self.local.account().clone();
        if let Some(p) = &self.profile {
            account.points = p.points;
            account.level = p.level;
            account.streak_count = p.streak_count;
            account.impact = p.impact();
            if account.student_number.is_empty() {
                account.student_number = p.student_number.clone();
            }
        }
        account
    }
}

// ──────────────────────────────────────────────
// Backend
// ──────────────────────────────────────────────

pub enum AccountBackend {
    LocalBacked(LocalAccount),
    RemoteBacked(RemoteAccount),
}

impl AccountBackend {
    fn local(&self) -> &LocalAccount {
        match self {
            AccountBackend::LocalBacked(local) => local,
            AccountBackend::RemoteBacked(remote) => &remote.local,
        }
    }

    fn local_mut(&mut self) -> &mut LocalAccount {
        match self {
            AccountBackend::LocalBacked(local) => local,
            AccountBackend::RemoteBacked(remote) => &mut remote.local,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AccountBackend::RemoteBacked(_))
    }

    /// Current view of the account.
    pub fn account(&self) -> UserAccount {
        match self {
            AccountBackend::LocalBacked(local) => local.account().clone(),
            AccountBackend::RemoteBacked(remote) => remote.merged(),
        }
    }

    pub fn challenge_status(&self, challenge_id: &str) -> ChallengeStatus {
        self.local().account().challenge_status(challenge_id)
    }

    /// Add points. The local record is always updated; a remote failure is
    /// returned but not rolled back.
    pub async fn add_points(&mut self, points: u64) -> Result<(), EngineError> {
        if points == 0 {
            return Ok(());
        }
        self.local_mut().account_mut().add_points(points);
        match self {
            AccountBackend::LocalBacked(_) => Ok(()),
            AccountBackend::RemoteBacked(remote) => {
                let update = match &remote.profile {
                    Some(p) => ProfileUpdate::add_points(p, points),
                    None => return Err(EngineError::RemoteUpdateFailed(RemoteError::NoProfile)),
                };
                remote.push(update).await
            }
        }
    }

    pub async fn add_impact(&mut self, delta: &ImpactDelta) -> Result<(), EngineError> {
        if delta.is_empty() {
            return Ok(());
        }
        self.local_mut().account_mut().add_impact(delta);
        match self {
            AccountBackend::LocalBacked(_) => Ok(()),
            AccountBackend::RemoteBacked(remote) => {
                let update = match &remote.profile {
                    Some(p) => ProfileUpdate::add_impact(p, delta),
                    None => return Err(EngineError::RemoteUpdateFailed(RemoteError::NoProfile)),
                };
                remote.push(update).await
            }
        }
    }

    /// Returns false when already active or completed.
    pub fn mark_challenge_active(&mut self, challenge_id: &str) -> bool {
        self.local_mut()
            .account_mut()
            .mark_challenge_active(challenge_id)
    }

    /// Returns false when already completed.
    pub fn mark_challenge_completed(&mut self, challenge_id: &str) -> bool {
        self.local_mut()
            .account_mut()
            .mark_challenge_completed(challenge_id)
    }

    /// Returns false when the badge was already held.
    pub fn grant_badge(&mut self, badge_id: &str) -> bool {
        self.local_mut().account_mut().grant_badge(badge_id)
    }

    /// Persist the local record.
    pub async fn flush(&self) -> Result<(), EngineError> {
        self.local().persist().await
    }

    /// Reset the local record. Remote totals are left as they are.
    pub async fn reset(&mut self) -> Result<(), EngineError> {
        self.local_mut().reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::StorageProfileClient;
    use async_trait::async_trait;
    use ecoquest_storage::MemoryStorage;

    struct DownClient;

    #[async_trait]
    impl ProfileClient for DownClient {
        async fn fetch_profile(&self, _: &str) -> Result<Option<Profile>, RemoteError> {
            Err(RemoteError::Unavailable("offline".to_string()))
        }
        async fn create_profile(&self, _: &str, _: &str) -> Result<Profile, RemoteError> {
            Err(RemoteError::Unavailable("offline".to_string()))
        }
        async fn update_profile(&self, _: &str, _: &ProfileUpdate) -> Result<Profile, RemoteError> {
            Err(RemoteError::Unavailable("offline".to_string()))
        }
    }

    fn storage() -> Arc<dyn KeyValueStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[tokio::test]
    async fn local_ledger_persists_and_reloads() {
        let storage = storage();
        let mut ledger = AccountBackend::LocalBacked(LocalAccount::load(storage.clone()).await);
        ledger.add_points(1200).await.unwrap();
        assert!(ledger.mark_challenge_active("zero-waste"));
        assert!(ledger.grant_badge("zero-waste-complete"));
        assert!(!ledger.grant_badge("zero-waste-complete"));
        ledger.flush().await.unwrap();

        let reloaded = LocalAccount::load(storage).await;
        assert_eq!(reloaded.account().points, 1200);
        assert_eq!(reloaded.account().level, 2);
        assert_eq!(reloaded.account().badges.len(), 1);
    }

    #[tokio::test]
    async fn malformed_local_record_uses_defaults() {
        let storage = storage();
        storage
            .put(ACCOUNT_KEY, "[1, 2".to_string())
            .await
            .unwrap();
        let local = LocalAccount::load(storage).await;
        assert_eq!(local.account(), &UserAccount::default());
    }

    #[tokio::test]
    async fn remote_connect_creates_missing_profile() {
        let remote_store = storage();
        let client = Arc::new(StorageProfileClient::new(remote_store));
        let local = LocalAccount::load(storage()).await;
        let (ledger, warning) = RemoteAccount::connect(client.clone(), "u1", "s1", local).await;
        assert!(warning.is_none());
        assert_eq!(ledger.profile().map(|p| p.level), Some(1));
        assert!(client.fetch_profile("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remote_wins_for_totals_local_wins_for_membership() {
        let client = Arc::new(StorageProfileClient::new(storage()));
        let profile = client.create_profile("u1", "s1").await.unwrap();
        client
            .update_profile("u1", &ProfileUpdate::add_points(&profile, 2500))
            .await
            .unwrap();

        let mut local = LocalAccount::load(storage()).await;
        local.account_mut().add_points(40);
        local.account_mut().grant_badge("water-conservation-complete");

        let (remote, _) = RemoteAccount::connect(client, "u1", "s1", local).await;
        let mut ledger = AccountBackend::RemoteBacked(remote);
        let view = ledger.account();
        assert_eq!(view.points, 2500);
        assert_eq!(view.level, 3);
        assert!(view.badges.contains("water-conservation-complete"));

        ledger.add_points(30).await.unwrap();
        assert_eq!(ledger.account().points, 2530);
    }

    #[tokio::test]
    async fn remote_failure_keeps_local_changes() {
        let local = LocalAccount::load(storage()).await;
        let (remote, warning) = RemoteAccount::connect(Arc::new(DownClient), "u1", "", local).await;
        assert!(matches!(warning, Some(EngineError::RemoteUpdateFailed(_))));

        let mut ledger = AccountBackend::RemoteBacked(remote);
        let err = ledger.add_points(30).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::RemoteUpdateFailed(RemoteError::NoProfile)
        ));
        assert_eq!(ledger.account().points, 30);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let storage = storage();
        let mut ledger = AccountBackend::LocalBacked(LocalAccount::load(storage.clone()).await);
        ledger.add_points(90).await.unwrap();
        ledger.flush().await.unwrap();
        ledger.reset().await.unwrap();
        assert_eq!(ledger.account(), UserAccount::default());
        assert!(storage.get(ACCOUNT_KEY).await.unwrap().is_none());
    }
}
