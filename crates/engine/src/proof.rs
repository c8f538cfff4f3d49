//! Proof collection and validation.
//!
//! Validation is a pure gate run before the progression engine touches any
//! state. Photo proof is deliberately weak: only the presence of an
//! acknowledgement is checked, never the image itself.

use ecoquest_core::{ProofKind, Task};
use serde::{Deserialize, Serialize};

use crate::error::ProofError;

/// Evidence a user submits for a single task completion. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ProofSubmission {
    /// The user confirmed a photo was taken. The token is opaque.
    Photo(String),
    /// Free text: a measurement, count or description.
    Text(String),
}

impl ProofSubmission {
    pub fn photo() -> Self {
        ProofSubmission::Photo("photo-ack".to_string())
    }

    pub fn text(s: impl Into<String>) -> Self {
        ProofSubmission::Text(s.into())
    }

    fn has_text(&self) -> bool {
        match self {
            ProofSubmission::Text(s) => !s.trim().is_empty(),
            ProofSubmission::Photo(_) => false,
        }
    }
}

/// Check that `submission` satisfies the task's proof requirement.
pub fn validate(task: &Task, submission: Option<&ProofSubmission>) -> Result<(), ProofError> {
    let ok = match task.proof_kind {
        ProofKind::None => true,
        ProofKind::Photo => submission.is_some(),
        ProofKind::Data | ProofKind::Text => submission.is_some_and(ProofSubmission::has_text),
    };
    if ok {
        Ok(())
    } else {
        Err(ProofError::MissingData {
            task_id: task.id.clone(),
            kind: task.proof_kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoquest_core::catalog;

    fn task_with(kind: ProofKind) -> Task {
        let mut t = catalog::tasks_for(catalog::WATER_CONSERVATION).remove(0);
        t.proof_kind = kind;
        t
    }

    #[test]
    fn none_accepts_anything() {
        let t = task_with(ProofKind::None);
        assert!(validate(&t, None).is_ok());
        assert!(validate(&t, Some(&ProofSubmission::text(""))).is_ok());
    }

    #[test]
    fn photo_needs_any_acknowledgement() {
        let t = task_with(ProofKind::Photo);
        assert!(validate(&t, Some(&ProofSubmission::photo())).is_ok());
        // Any submission counts as acknowledgement.
        assert!(validate(&t, Some(&ProofSubmission::text("took it"))).is_ok());
        assert_eq!(
            validate(&t, None),
            Err(ProofError::MissingData {
                task_id: "tooth-brushing".to_string(),
                kind: ProofKind::Photo,
            })
        );
    }

    #[test]
    fn data_rejects_empty_and_whitespace() {
        let t = task_with(ProofKind::Data);
        assert!(validate(&t, Some(&ProofSubmission::text("4 minutes"))).is_ok());
        assert!(validate(&t, Some(&ProofSubmission::text(""))).is_err());
        assert!(validate(&t, Some(&ProofSubmission::text("   \n"))).is_err());
        assert!(validate(&t, None).is_err());
    }

    #[test]
    fn text_rejects_photo_only() {
        let t = task_with(ProofKind::Text);
        assert!(validate(&t, Some(&ProofSubmission::photo())).is_err());
        assert!(validate(&t, Some(&ProofSubmission::text("use a bucket"))).is_ok());
    }

    #[test]
    fn submission_json_shape() {
        let json = serde_json::to_value(ProofSubmission::text("12 L")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "text", "value": "12 L"}));
    }
}
