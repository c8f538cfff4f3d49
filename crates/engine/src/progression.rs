//! Challenge progression engine.
//!
//! Pure state transitions over a [`ChallengeProgress`]:
//!
//! 1. Precondition check (task exists, unlocked, not yet completed)
//! 2. Proof re-validation
//! 3. Completion: flag the task, award its points, accrue water saved
//! 4. Challenge-complete decision
//!
//! Per task the lifecycle is `locked -> unlocked -> completed` with no
//! regression. Every check runs before the first mutation, so a rejected
//! completion leaves the progress untouched. Scheduling the follow-up unlock
//! is the session's job; this module only reports whether one is due.

use std::ops::RangeInclusive;

use ecoquest_core::{catalog, ChallengeProgress, Task};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EngineError, ProgressionError};
use crate::proof::{self, ProofSubmission};

/// Litres credited per completed task in a water-tracking challenge.
pub const WATER_BONUS_RANGE: RangeInclusive<u32> = 5..=14;

/// Source of the per-task water bonus. Seed it for reproducible runs.
#[derive(Debug, Clone)]
pub struct ImpactRoller {
    rng: StdRng,
}

impl ImpactRoller {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Water bonus for one task of `challenge_id`; 0 unless it tracks water.
    pub fn water_bonus(&mut self, challenge_id: &str) -> u32 {
        match catalog::challenge_info(challenge_id) {
            Some(info) if info.tracks_water => self.rng.gen_range(WATER_BONUS_RANGE),
            _ => 0,
        }
    }
}

/// Outcome of a successful [`complete_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task_id: String,
    pub awarded_points: u32,
    /// Litres added to the progress' water counter by this task.
    pub water_added: u32,
    pub challenge_complete: bool,
}

/// Find `task_id` and check it can be completed right now.
pub fn check_completable<'a>(
    progress: &'a ChallengeProgress,
    task_id: &str,
) -> Result<&'a Task, ProgressionError> {
    let task = progress
        .task(task_id)
        .ok_or_else(|| ProgressionError::TaskNotFound {
            challenge_id: progress.challenge_id.clone(),
            task_id: task_id.to_string(),
        })?;
    if task.completed {
        return Err(ProgressionError::AlreadyCompleted {
            task_id: task_id.to_string(),
        });
    }
    if task.locked {
        return Err(ProgressionError::TaskLocked {
            task_id: task_id.to_string(),
            day_number: task.day_number,
        });
    }
    Ok(task)
}

/// Complete one task.
///
/// Re-validates lock state, completion state and proof even though callers
/// normally check first. On success the task is flagged, its points are
/// reported as awarded, and the water counter grows by the rolled bonus.
pub fn complete_task(
    progress: &mut ChallengeProgress,
    task_id: &str,
    submission: Option<&ProofSubmission>,
    roller: &mut ImpactRoller,
) -> Result<TaskCompletion, EngineError> {
    let task = check_completable(progress, task_id)?;
    proof::validate(task, submission)?;

    let water_added = roller.water_bonus(&progress.challenge_id);
    let Some(task) = progress.task_mut(task_id) else {
        return Err(ProgressionError::TaskNotFound {
            challenge_id: progress.challenge_id.clone(),
            task_id: task_id.to_string(),
        }
        .into());
    };
    task.completed = true;
    let awarded_points = task.points;
    progress.water_saved = progress.water_saved.saturating_add(water_added);

    Ok(TaskCompletion {
        task_id: task_id.to_string(),
        awarded_points,
        water_added,
        challenge_complete: progress.is_complete(),
    })
}

/// Unlock the task for `current_day + 1` and advance the day counter.
///
/// Returns false (and changes nothing) when there is no next day.
pub fn unlock_next(progress: &mut ChallengeProgress) -> bool {
    let next_day = progress.current_day + 1;
    let mut found = false;
    for task in progress.tasks.iter_mut().filter(|t| t.day_number == next_day) {
        task.locked = false;
        found = true;
    }
    if found {
        progress.current_day = next_day;
    }
    found
}

/// True when the current day's task is done and the next day is still locked,
/// i.e. an unlock is owed but has not been applied yet.
pub fn pending_unlock(progress: &ChallengeProgress) -> bool {
    let current_done = progress
        .tasks
        .iter()
        .filter(|t| t.day_number == progress.current_day)
        .all(|t| t.completed);
    let next_locked = progress
        .tasks
        .iter()
        .any(|t| t.day_number == progress.current_day + 1 && t.locked);
    current_done && next_locked
}

/// Completed / total in `[0, 1]`; 0 for an empty task list.
pub fn progress_percentage(progress: &ChallengeProgress) -> f64 {
    progress.completion_ratio()
}
