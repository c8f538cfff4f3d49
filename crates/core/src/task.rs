//! Task definitions and per-task lock/completion state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a user must submit before a task can be marked complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofKind {
    /// A photo of the completed action. Only an acknowledgement is checked.
    Photo,
    /// A measurement or count entered as free text.
    Data,
    /// A short description of what was done.
    Text,
    /// No proof required.
    None,
}

impl ProofKind {
    /// True when the task needs any submission at all.
    pub fn requires_submission(self) -> bool {
        !matches!(self, ProofKind::None)
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProofKind::Photo => "photo",
            ProofKind::Data => "data",
            ProofKind::Text => "text",
            ProofKind::None => "none",
        };
        f.write_str(s)
    }
}

/// Where a task sits in its `locked -> unlocked -> completed` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Locked,
    Unlocked,
    Completed,
}

/// One day's unit of work within a challenge.
///
/// The descriptive fields come from the static catalog and never change.
/// `completed` and `locked` are the only mutable flags and are owned by the
/// progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub proof_kind: ProofKind,
    pub points: u32,
    pub educational_tip: String,
    /// 1-based day index within the challenge.
    pub day_number: u32,
    pub completed: bool,
    pub locked: bool,
}

impl Task {
    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Completed
        } else if self.locked {
            TaskState::Locked
        } else {
            TaskState::Unlocked
        }
    }

    /// Unlocked and not yet completed.
    pub fn is_available(&self) -> bool {
        self.state() == TaskState::Unlocked
    }

    /// Instructions are only shown while the task can be worked on.
    pub fn visible_instructions(&self) -> Option<&str> {
        self.is_available().then_some(self.instructions.as_str())
    }
}
