//! Session controller.
//!
//! A [`Session`] owns one user's progress cache, account ledger, notifier,
//! unlock scheduler and impact roller. Every `load -> mutate -> save`
//! sequence runs under one async mutex, so callers see each operation as
//! atomic. Deferred unlocks hold only a weak handle and do nothing once the
//! session is gone.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use ecoquest_core::{catalog, ChallengeProgress, ChallengeStatus, ImpactDelta, UserAccount};
use ecoquest_storage::KeyValueStorage;
use tokio::sync::Mutex;

use crate::account::{AccountBackend, LocalAccount, RemoteAccount};
use crate::config::{ConfigError, EngineConfig, PersistenceMode};
use crate::error::{EngineError, ProgressionError};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::progression::{self, ImpactRoller};
use crate::proof::{self, ProofSubmission};
use crate::remote::ProfileClient;
use crate::scheduler::UnlockScheduler;
use crate::store::ProgressStore;

// ──────────────────────────────────────────────
// Reports
// ──────────────────────────────────────────────

/// One-time rewards granted when a challenge is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReward {
    pub badge: String,
    pub co2_saved: u64,
    pub water_saved: u64,
    pub bonus_points: u32,
}

/// Result of a successful [`Session::complete_task`].
#[derive(Debug)]
pub struct CompletionReport {
    pub challenge_id: String,
    pub task_id: String,
    pub awarded_points: u32,
    pub water_added: u32,
    pub challenge_complete: bool,
    /// Present only the first time the challenge completes.
    pub reward: Option<CompletionReward>,
    pub progress: ChallengeProgress,
    /// Non-fatal failures (persistence, remote updates) hit along the way.
    pub warnings: Vec<EngineError>,
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

#[derive(Default)]
pub struct SessionBuilder {
    storage: Option<Arc<dyn KeyValueStorage>>,
    config: EngineConfig,
    notifier: Option<Arc<dyn Notifier>>,
    profile_client: Option<Arc<dyn ProfileClient>>,
}

impl SessionBuilder {
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn profile_client(mut self, client: Arc<dyn ProfileClient>) -> Self {
        self.profile_client = Some(client);
        self
    }

    /// Load the account and pick the persistence mode.
    ///
    /// A remote profile that cannot be fetched or created is reported through
    /// the notifier; the session then runs on local totals.
    pub async fn start(self) -> Result<Session, EngineError> {
        self.config.validate()?;
        let storage = self
            .storage
            .ok_or_else(|| ConfigError::Invalid("session needs a storage backend".to_string()))?;
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let local = LocalAccount::load(storage.clone()).await;
        let ledger = match self.config.persistence.mode {
            PersistenceMode::Local => AccountBackend::LocalBacked(local),
            PersistenceMode::Remote => {
                let client = self.profile_client.ok_or_else(|| {
                    ConfigError::Invalid("remote persistence needs a profile client".to_string())
                })?;
                let user_id = self.config.persistence.user_id.clone().unwrap_or_default();
                let (remote, warning) = RemoteAccount::connect(
                    client,
                    &user_id,
                    &self.config.persistence.student_number,
                    local,
                )
                .await;
                if let Some(e) = warning {
                    notifier.notify(Notification::error("Error loading profile", e.to_string()));
                }
                AccountBackend::RemoteBacked(remote)
            }
        };

        tracing::info!(
            remote = ledger.is_remote(),
            unlock_delay_ms = self.config.unlock_delay_ms,
            "session started"
        );

        let inner = SessionInner {
            store: ProgressStore::new(storage),
            notifier,
            scheduler: UnlockScheduler::new(),
            state: Mutex::new(SessionState {
                progress: HashMap::new(),
                ledger,
                roller: ImpactRoller::new(self.config.impact_seed),
            }),
            config: self.config,
        };
        Ok(Session {
            inner: Arc::new(inner),
        })
    }
}

// ──────────────────────────────────────────────
// Session
// ──────────────────────────────────────────────

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: ProgressStore,
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
    scheduler: UnlockScheduler,
    state: Mutex<SessionState>,
}

struct SessionState {
    progress: HashMap<String, ChallengeProgress>,
    ledger: AccountBackend,
    roller: ImpactRoller,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current progress for a challenge, loading it on first access.
    ///
    /// Unknown challenge ids yield an empty progress record.
    pub async fn load_progress(&self, challenge_id: &str) -> ChallengeProgress {
        let mut state = self.inner.state.lock().await;
        match self.inner.cached(&mut state.progress, challenge_id).await {
            Some(progress) => progress.clone(),
            None => unknown_progress(challenge_id),
        }
    }

    /// Complete a task with the given proof.
    pub async fn complete_task(
        &self,
        challenge_id: &str,
        task_id: &str,
        submission: Option<ProofSubmission>,
    ) -> Result<CompletionReport, EngineError> {
        let inner = &self.inner;
        let mut guard = inner.state.lock().await;
        let SessionState {
            progress: cache,
            ledger,
            roller,
        } = &mut *guard;
        let mut scratch;
        let progress = match inner.cached(cache, challenge_id).await {
            Some(progress) => progress,
            None => {
                scratch = unknown_progress(challenge_id);
                &mut scratch
            }
        };

        // Validation: nothing below this block runs on rejection.
        let task = match progression::check_completable(progress, task_id) {
            Ok(task) => task,
            Err(e) => {
                inner.notify_rejection(&e);
                return Err(e.into());
            }
        };
        if let Err(e) = proof::validate(task, submission.as_ref()) {
            inner.notifier.notify(Notification::error(
                "Data Required",
                "Please enter the required data to complete this task.",
            ));
            return Err(e.into());
        }

        let done = progression::complete_task(progress, task_id, submission.as_ref(), roller)?;
        // Task points were paid out when the challenge first completed; a
        // lost progress record must not pay them again.
        let awarded_points = match ledger.challenge_status(challenge_id) {
            ChallengeStatus::Completed => 0,
            _ => done.awarded_points,
        };
        tracing::info!(
            %challenge_id,
            %task_id,
            points = awarded_points,
            water_added = done.water_added,
            "task completed"
        );

        if !done.challenge_complete {
            let delay = inner.config.unlock_delay();
            if delay.is_zero() {
                progression::unlock_next(progress);
            } else {
                inner.schedule_unlock(Arc::downgrade(&self.inner), challenge_id, delay);
            }
        }

        let mut warnings = Vec::new();
        if let Err(e) = inner.store.save(progress).await {
            tracing::warn!(%challenge_id, error = %e, "progress save failed");
            warnings.push(EngineError::PersistenceUnavailable(e));
        }
        let progress = progress.clone();

        ledger.mark_challenge_active(challenge_id);
        if awarded_points > 0 {
            if let Err(e) = ledger.add_points(u64::from(awarded_points)).await {
                warnings.push(e);
            }
        }

        let reward = if done.challenge_complete {
            grant_completion(ledger, &progress, &mut warnings).await
        } else {
            None
        };

        if let Err(e) = ledger.flush().await {
            tracing::warn!(error = %e, "account save failed");
            warnings.push(e);
        }
        drop(guard);

        let mut message = format!("You earned {} points!", awarded_points);
        if catalog::challenge_info(challenge_id).is_some_and(|c| c.tracks_water) {
            message.push_str(&format!(" Water saved: {}L", progress.water_saved));
        }
        inner
            .notifier
            .notify(Notification::success("Task Completed!", message));
        if reward.is_some() {
            inner.notifier.notify(Notification::success(
                "Challenge Complete!",
                "Congratulations! You've completed the entire challenge!",
            ));
        }
        for w in &warnings {
            inner.notify_warning(w);
        }

        Ok(CompletionReport {
            challenge_id: challenge_id.to_string(),
            task_id: task_id.to_string(),
            awarded_points,
            water_added: done.water_added,
            challenge_complete: done.challenge_complete,
            reward,
            progress,
            warnings,
        })
    }

    /// Mark a challenge active. Returns false when it already was active or
    /// has been completed.
    ///
    /// A failed account write does not undo the start; it is sent to the
    /// notifier as "Progress not saved".
    pub async fn start_challenge(&self, challenge_id: &str) -> Result<bool, EngineError> {
        if catalog::challenge_info(challenge_id).is_none() {
            return Err(EngineError::UnknownChallenge {
                challenge_id: challenge_id.to_string(),
            });
        }
        let mut state = self.inner.state.lock().await;
        let started = state.ledger.mark_challenge_active(challenge_id);
        if started {
            if let Err(e) = state.ledger.flush().await {
                tracing::warn!(%challenge_id, error = %e, "account save failed");
                self.inner.notify_warning(&e);
            }
            tracing::info!(%challenge_id, "challenge started");
        }
        Ok(started)
    }

    pub async fn challenge_status(&self, challenge_id: &str) -> ChallengeStatus {
        self.inner.state.lock().await.ledger.challenge_status(challenge_id)
    }

    pub async fn account(&self) -> UserAccount {
        self.inner.state.lock().await.ledger.account()
    }

    /// Restore the default account and forget progress for every challenge.
    pub async fn reset_account(&self) -> Result<(), EngineError> {
        self.inner.scheduler.cancel_all();
        let mut state = self.inner.state.lock().await;
        state.progress.clear();
        let cleared = self.inner.store.clear_all().await?;
        tracing::debug!(records = cleared, "progress records cleared");
        state.ledger.reset().await?;
        tracing::info!("account reset");
        Ok(())
    }

    pub fn is_unlock_pending(&self, challenge_id: &str) -> bool {
        self.inner.scheduler.is_pending(challenge_id)
    }

    /// Leave a challenge view: cancel its pending unlock and drop the cached
    /// progress. The next load re-applies an unlock that is still owed.
    pub async fn close_challenge(&self, challenge_id: &str) {
        self.inner.scheduler.cancel(challenge_id);
        self.inner.state.lock().await.progress.remove(challenge_id);
    }

    /// Cancel every pending unlock and drop all cached progress.
    pub async fn shutdown(&self) {
        self.inner.scheduler.cancel_all();
        self.inner.state.lock().await.progress.clear();
        tracing::debug!("session shut down");
    }
}

impl SessionInner {
    /// Cached progress for `challenge_id`, loading and reconciling on a miss.
    /// Ids outside the catalog are never cached.
    async fn cached<'a>(
        &self,
        cache: &'a mut HashMap<String, ChallengeProgress>,
        challenge_id: &str,
    ) -> Option<&'a mut ChallengeProgress> {
        catalog::challenge_info(challenge_id)?;
        match cache.entry(challenge_id.to_string()) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => Some(entry.insert(self.load_reconciled(challenge_id).await)),
        }
    }

    /// Load from the store and apply an unlock that is owed but was never
    /// applied (its deferred task died with an earlier session).
    async fn load_reconciled(&self, challenge_id: &str) -> ChallengeProgress {
        let mut progress = self.store.load(challenge_id).await;
        if progression::pending_unlock(&progress)
            && !self.scheduler.is_pending(challenge_id)
            && progression::unlock_next(&mut progress)
        {
            tracing::info!(%challenge_id, day = progress.current_day, "applied owed unlock on load");
            if let Err(e) = self.store.save(&progress).await {
                tracing::warn!(%challenge_id, error = %e, "progress save failed");
                self.notify_warning(&EngineError::PersistenceUnavailable(e));
            }
        }
        progress
    }

    fn schedule_unlock(&self, weak: Weak<SessionInner>, challenge_id: &str, delay: std::time::Duration) {
        let id = challenge_id.to_string();
        tracing::debug!(%challenge_id, delay_ms = delay.as_millis() as u64, "unlock scheduled");
        self.scheduler.schedule(challenge_id, delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.apply_deferred_unlock(&id).await;
            }
        });
    }

    async fn apply_deferred_unlock(&self, challenge_id: &str) {
        let mut state = self.state.lock().await;
        let Some(progress) = state.progress.get_mut(challenge_id) else {
            return;
        };
        if !progression::pending_unlock(progress) || !progression::unlock_next(progress) {
            return;
        }
        tracing::info!(%challenge_id, day = progress.current_day, "deferred unlock applied");
        if let Err(e) = self.store.save(progress).await {
            tracing::warn!(%challenge_id, error = %e, "progress save failed");
            self.notify_warning(&EngineError::PersistenceUnavailable(e));
        }
    }

    /// Surface a non-fatal failure. Other errors are not warnings and are ignored.
    fn notify_warning(&self, e: &EngineError) {
        let n = match e {
            EngineError::RemoteUpdateFailed(_) => {
                Notification::error("Error updating profile", e.to_string())
            }
            EngineError::PersistenceUnavailable(_) => Notification::warning(
                "Progress not saved",
                format!("Your progress is kept for now but could not be stored: {e}"),
            ),
            _ => return,
        };
        self.notifier.notify(n);
    }

    fn notify_rejection(&self, e: &ProgressionError) {
        let n = match e {
            ProgressionError::TaskLocked { .. } => Notification::warning(
                "Task Locked",
                "Complete the previous task to unlock this one!",
            ),
            ProgressionError::AlreadyCompleted { .. } => {
                Notification::warning("Already Completed", "You've already completed this task!")
            }
            ProgressionError::TaskNotFound { .. } => {
                Notification::error("Task Not Found", e.to_string())
            }
        };
        self.notifier.notify(n);
    }
}

/// Empty progress for an id outside the catalog.
fn unknown_progress(challenge_id: &str) -> ChallengeProgress {
    ChallengeProgress::fresh(challenge_id, Vec::new())
}

/// Apply the one-time challenge rewards. Returns `None` when the challenge
/// was already recorded as completed.
async fn grant_completion(
    ledger: &mut AccountBackend,
    progress: &ChallengeProgress,
    warnings: &mut Vec<EngineError>,
) -> Option<CompletionReward> {
    let challenge_id = progress.challenge_id.as_str();
    if !ledger.mark_challenge_completed(challenge_id) {
        tracing::debug!(%challenge_id, "challenge already completed, no rewards");
        return None;
    }
    let (co2, bonus) = catalog::challenge_info(challenge_id)
        .map(|c| (c.completion_co2, c.completion_bonus))
        .unwrap_or((0, 0));
    let water = u64::from(progress.water_saved);

    let delta = ImpactDelta {
        co2_saved: Some(co2),
        water_saved: Some(water),
        energy_saved: None,
    };
    if let Err(e) = ledger.add_impact(&delta).await {
        warnings.push(e);
    }
    if let Err(e) = ledger.add_points(u64::from(bonus)).await {
        warnings.push(e);
    }
    let badge = catalog::badge_id(challenge_id);
    ledger.grant_badge(&badge);
    tracing::info!(%challenge_id, %badge, co2, water, bonus, "challenge completed");

    Some(CompletionReward {
        badge,
        co2_saved: co2,
        water_saved: water,
        bonus_points: bonus,
    })
}
