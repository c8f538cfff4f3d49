//! ecoquest-engine: challenge progression and the session controller.
//!
//! Data flows leaf to root:
//!
//! - [`proof`] validates submitted evidence
//! - [`progression`] applies completions and unlocks to a `ChallengeProgress`
//! - [`store`] loads and saves progress records
//! - [`account`] is the points/impact/badge ledger, local or remote backed
//! - [`session`] ties them together behind one async mutex per user
//!
//! ```no_run
//! # async fn demo() -> Result<(), ecoquest_engine::EngineError> {
//! use std::sync::Arc;
//! use ecoquest_engine::{ProofSubmission, Session};
//! use ecoquest_storage::MemoryStorage;
//!
//! let session = Session::builder()
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .start()
//!     .await?;
//! let report = session
//!     .complete_task("water-conservation", "tooth-brushing", Some(ProofSubmission::photo()))
//!     .await?;
//! assert_eq!(report.awarded_points, 30);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod config;
pub mod error;
pub mod notify;
pub mod progression;
pub mod proof;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod store;

pub use account::{AccountBackend, LocalAccount, RemoteAccount, ACCOUNT_KEY};
pub use config::{ConfigError, EngineConfig, PersistenceConfig, PersistenceMode};
pub use error::{EngineError, ProgressionError, ProofError};
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use progression::{progress_percentage, ImpactRoller, TaskCompletion, WATER_BONUS_RANGE};
pub use proof::ProofSubmission;
pub use remote::{Profile, ProfileClient, ProfileUpdate, RemoteError, StorageProfileClient};
pub use scheduler::UnlockScheduler;
pub use session::{CompletionReport, CompletionReward, Session, SessionBuilder};
pub use store::{progress_key, ProgressStore};
