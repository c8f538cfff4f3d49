//! Remote-backed sessions: profile lifecycle, reconciliation and fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ecoquest_core::catalog::{WATER_CONSERVATION, ZERO_WASTE};
use ecoquest_engine::{
    EngineConfig, EngineError, PersistenceConfig, PersistenceMode, Profile, ProfileClient,
    ProfileUpdate, ProofSubmission, RecordingNotifier, RemoteError, Session, StorageProfileClient,
};
use ecoquest_storage::{KeyValueStorage, MemoryStorage};

fn remote_config(user_id: &str) -> EngineConfig {
    EngineConfig {
        impact_seed: Some(5),
        persistence: PersistenceConfig {
            mode: PersistenceMode::Remote,
            user_id: Some(user_id.to_string()),
            student_number: "s4455667".to_string(),
        },
        ..Default::default()
    }
}

async fn remote_session(
    client: Arc<dyn ProfileClient>,
    local: Arc<dyn KeyValueStorage>,
) -> (Session, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let session = Session::builder()
        .storage(local)
        .config(remote_config("user-1"))
        .notifier(notifier.clone())
        .profile_client(client)
        .start()
        .await
        .unwrap();
    (session, notifier)
}

/// Wraps a working client and fails updates on demand.
struct SwitchableClient {
    inner: StorageProfileClient,
    fail: AtomicBool,
}

#[async_trait]
impl ProfileClient for SwitchableClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError> {
        self.inner.fetch_profile(user_id).await
    }
    async fn create_profile(&self, user_id: &str, student: &str) -> Result<Profile, RemoteError> {
        self.inner.create_profile(user_id, student).await
    }
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, RemoteError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection reset".to_string()));
        }
        self.inner.update_profile(user_id, update).await
    }
}

struct OfflineClient;

#[async_trait]
impl ProfileClient for OfflineClient {
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

#[tokio::test]
async fn start_creates_profile_with_student_number() {
    let client = Arc::new(StorageProfileClient::new(Arc::new(MemoryStorage::new())));
    let (_session, notifier) =
        remote_session(client.clone(), Arc::new(MemoryStorage::new())).await;

    let profile = client.fetch_profile("user-1").await.unwrap().unwrap();
    assert_eq!(profile.student_number, "s4455667");
    assert_eq!(profile.points, 0);
    assert_eq!(profile.level, 1);
    assert!(notifier.titles().is_empty());
}

#[tokio::test]
async fn completion_updates_remote_totals() {
    let client = Arc::new(StorageProfileClient::new(Arc::new(MemoryStorage::new())));
    let (session, _) = remote_session(client.clone(), Arc::new(MemoryStorage::new())).await;

    let tasks = session.load_progress(WATER_CONSERVATION).await.tasks;
    for task in &tasks {
        let proof = match task.proof_kind {
            ecoquest_core::ProofKind::Photo => ProofSubmission::photo(),
            _ => ProofSubmission::text("done"),
        };
        let report = session
            .complete_task(WATER_CONSERVATION, &task.id, Some(proof))
            .await
            .unwrap();
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }
    let water = session.load_progress(WATER_CONSERVATION).await.water_saved;

    let profile = client.fetch_profile("user-1").await.unwrap().unwrap();
    assert_eq!(profile.points, 180);
    assert_eq!(profile.total_co2_saved, 5);
    assert_eq!(profile.total_water_saved, u64::from(water));

    let account = session.account().await;
    assert_eq!(account.points, 180);
    assert!(account.badges.contains("water-conservation-complete"));
}

#[tokio::test]
async fn remote_totals_win_over_local_and_local_membership_wins() {
    let remote_store = Arc::new(MemoryStorage::new());
    let client = Arc::new(StorageProfileClient::new(remote_store));
    let profile = client.create_profile("user-1", "s4455667").await.unwrap();
    client
        .update_profile("user-1", &ProfileUpdate::add_points(&profile, 5000))
        .await
        .unwrap();

    // A local-only history with its own totals and memberships.
    let local: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    {
        let notifier = Arc::new(RecordingNotifier::new());
        let offline = Session::builder()
            .storage(local.clone())
            .config(EngineConfig::default())
            .notifier(notifier)
            .start()
            .await
            .unwrap();
        offline.start_challenge(ZERO_WASTE).await.unwrap();
        offline
            .complete_task(ZERO_WASTE, "refuse-plastic", Some(ProofSubmission::photo()))
            .await
            .unwrap();
        assert_eq!(offline.account().await.points, 43);
    }

    let (session, _) = remote_session(client, local).await;
    let account = session.account().await;
    assert_eq!(account.points, 5000);
    assert_eq!(account.level, 6);
    assert!(account.active_challenges.contains(ZERO_WASTE));
}

#[tokio::test]
async fn failed_update_is_warning_and_local_state_kept() {
    let client = Arc::new(SwitchableClient {
        inner: StorageProfileClient::new(Arc::new(MemoryStorage::new())),
        fail: AtomicBool::new(false),
    });
    let (session, notifier) = remote_session(client.clone(), Arc::new(MemoryStorage::new())).await;
    client.fail.store(true, Ordering::SeqCst);

    let report = session
        .complete_task(ZERO_WASTE, "refuse-plastic", Some(ProofSubmission::photo()))
        .await
        .unwrap();
    assert_eq!(report.awarded_points, 43);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, EngineError::RemoteUpdateFailed(_))));
    assert!(report.progress.task("refuse-plastic").unwrap().completed);
    assert!(notifier
        .titles()
        .iter()
        .any(|t| t == "Error updating profile"));

    // Remote kept its old totals; the task is still done locally.
    let profile = client.fetch_profile("user-1").await.unwrap().unwrap();
    assert_eq!(profile.points, 0);
    let err = session
        .complete_task(ZERO_WASTE, "refuse-plastic", Some(ProofSubmission::photo()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyCompleted { .. }));
}

#[tokio::test]
async fn unreachable_profile_falls_back_to_local_totals() {
    let (session, notifier) =
        remote_session(Arc::new(OfflineClient), Arc::new(MemoryStorage::new())).await;
    assert_eq!(notifier.titles(), vec!["Error loading profile"]);

    let report = session
        .complete_task(ZERO_WASTE, "refuse-plastic", Some(ProofSubmission::photo()))
        .await
        .unwrap();
    assert!(matches!(
        report.warnings.as_slice(),
        [EngineError::RemoteUpdateFailed(RemoteError::NoProfile)]
    ));
    assert_eq!(session.account().await.points, 43);
}

#[tokio::test]
async fn remote_mode_without_client_is_config_error() {
    let result = Session::builder()
        .storage(Arc::new(MemoryStorage::new()))
        .config(remote_config("user-1"))
        .start()
        .await;
    assert!(matches!(result, Err(EngineError::Config(_))));
}
