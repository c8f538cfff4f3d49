//! ecoquest-core: EcoQuest domain types and the static challenge catalog.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Task`], [`ProofKind`], [`TaskState`] -- a single day's unit of work
//! - [`ChallengeProgress`] -- the per-challenge record the progress store persists
//! - [`UserAccount`], [`ImpactTotals`], [`ImpactDelta`] -- account totals and sets
//! - [`catalog`] -- immutable challenge metadata and task lists

pub mod account;
pub mod catalog;
pub mod progress;
pub mod task;

// ── Convenience re-exports ────────────────────────────────────────────

pub use account::{level_for_points, ChallengeStatus, ImpactDelta, ImpactTotals, UserAccount};
pub use catalog::{challenge_info, tasks_for, ChallengeInfo, Difficulty};
pub use progress::ChallengeProgress;
pub use task::{ProofKind, Task, TaskState};
