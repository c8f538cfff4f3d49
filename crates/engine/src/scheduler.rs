//! Deferred unlock scheduling.
//!
//! At most one pending unlock per challenge. Scheduling again replaces the
//! previous task; dropping the scheduler aborts everything still pending.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

type PendingMap = HashMap<String, (u64, JoinHandle<()>)>;

#[derive(Debug, Default)]
pub struct UnlockScheduler {
    pending: Arc<Mutex<PendingMap>>,
    next_ticket: AtomicU64,
}

impl UnlockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` for `challenge_id` once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, challenge_id: &str, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = challenge_id.to_string();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::downgrade(&self.pending);
        let mut map = lock(&self.pending);
        let handle = tokio::spawn({
            let id = id.clone();
            async move {
                tokio::time::sleep(delay).await;
                job.await;
                if let Some(pending) = pending.upgrade() {
                    let mut map = lock(&pending);
                    // Only clear our own entry; a replacement may own the slot.
                    if map.get(&id).is_some_and(|(t, _)| *t == ticket) {
                        map.remove(&id);
                    }
                }
            }
        });
        if let Some((_, previous)) = map.insert(id, (ticket, handle)) {
            previous.abort();
            tracing::debug!(%challenge_id, "replaced pending unlock");
        }
    }

    /// Cancel the pending unlock for a challenge. Returns true if one existed.
    pub fn cancel(&self, challenge_id: &str) -> bool {
        match lock(&self.pending).remove(challenge_id) {
            Some((_, handle)) => {
                handle.abort();
                tracing::debug!(%challenge_id, "cancelled pending unlock");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, (_, handle)) in lock(&self.pending).drain() {
            handle.abort();
        }
    }

    pub fn is_pending(&self, challenge_id: &str) -> bool {
        lock(&self.pending)
            .get(challenge_id)
            .is_some_and(|(_, h)| !h.is_finished())
    }
}

impl Drop for UnlockScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn lock(m: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
