//! User account totals and membership sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Points needed per level.
pub const POINTS_PER_LEVEL: u64 = 1000;

/// Level for a point total: `floor(points / 1000) + 1`.
pub fn level_for_points(points: u64) -> u32 {
    u32::try_from(points / POINTS_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Cumulative environmental impact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTotals {
    /// Kilograms of CO2 avoided.
    pub co2_saved: u64,
    /// Litres of water saved.
    pub water_saved: u64,
    /// kWh of energy saved.
    pub energy_saved: u64,
}

/// An increment to [`ImpactTotals`]. Absent or zero fields leave the total alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_saved: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_saved: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_saved: Option<u64>,
}

impl ImpactDelta {
    pub fn is_empty(&self) -> bool {
        [self.co2_saved, self.water_saved, self.energy_saved]
            .iter()
            .all(|v| v.unwrap_or(0) == 0)
    }
}

impl ImpactTotals {
    pub fn apply(&mut self, delta: &ImpactDelta) {
        self.co2_saved = self.co2_saved.saturating_add(delta.co2_saved.unwrap_or(0));
        self.water_saved = self
            .water_saved
            .saturating_add(delta.water_saved.unwrap_or(0));
        self.energy_saved = self
            .energy_saved
            .saturating_add(delta.energy_saved.unwrap_or(0));
    }
}

/// Where a challenge stands for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeStatus {
    NotStarted,
    Active,
    Completed,
}

/// The user's account as seen by the progression core.
///
/// Unknown or missing fields in a stored record fall back to the defaults, so
/// older records keep loading as fields are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserAccount {
    pub student_number: String,
    pub points: u64,
    pub level: u32,
    pub streak_count: u32,
    pub impact: ImpactTotals,
    pub completed_challenges: BTreeSet<String>,
    pub active_challenges: BTreeSet<String>,
    pub badges: BTreeSet<String>,
}

impl Default for UserAccount {
    fn default() -> Self {
        UserAccount {
            student_number: String::new(),
            points: 0,
            level: 1,
            streak_count: 0,
            impact: ImpactTotals::default(),
            completed_challenges: BTreeSet::new(),
            active_challenges: BTreeSet::new(),
            badges: BTreeSet::new(),
        }
    }
}

impl UserAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points and recompute the level.
    pub fn add_points(&mut self, points: u64) {
        self.points = self.points.saturating_add(points);
        self.level = level_for_points(self.points);
    }

    pub fn add_impact(&mut self, delta: &ImpactDelta) {
        self.impact.apply(delta);
    }

    /// Mark a challenge active. Returns false when it was already active or
    /// has been completed.
    pub fn mark_challenge_active(&mut self, challenge_id: &str) -> bool {
        if self.completed_challenges.contains(challenge_id) {
            return false;
        }
        self.active_challenges.insert(challenge_id.to_string())
    }

    /// Move a challenge into the completed set. Returns false when it was
    /// already completed.
    pub fn mark_challenge_completed(&mut self, challenge_id: &str) -> bool {
        self.active_challenges.remove(challenge_id);
        self.completed_challenges.insert(challenge_id.to_string())
    }

    /// Returns false when the badge was already held.
    pub fn grant_badge(&mut self, badge_id: &str) -> bool {
        self.badges.insert(badge_id.to_string())
    }

    pub fn challenge_status(&self, challenge_id: &str) -> ChallengeStatus {
        if self.completed_challenges.contains(challenge_id) {
            ChallengeStatus::Completed
        } else if self.active_challenges.contains(challenge_id) {
            ChallengeStatus::Active
        } else {
            ChallengeStatus::NotStarted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_steps_every_thousand_points() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(999), 1);
        assert_eq!(level_for_points(1000), 2);
        assert_eq!(level_for_points(2500), 3);
    }

    #[test]
    fn add_points_updates_level() {
        let mut a = UserAccount::new();
        a.add_points(980);
        assert_eq!(a.level, 1);
        a.add_points(30);
        assert_eq!(a.points, 1010);
        assert_eq!(a.level, 2);
    }

    #[test]
    fn challenge_never_in_both_sets() {
        let mut a = UserAccount::new();
        assert!(a.mark_challenge_active("zero-waste"));
        assert!(!a.mark_challenge_active("zero-waste"));
        assert_eq!(a.challenge_status("zero-waste"), ChallengeStatus::Active);

        assert!(a.mark_challenge_completed("zero-waste"));
        assert!(!a.active_challenges.contains("zero-waste"));
        assert_eq!(a.challenge_status("zero-waste"), ChallengeStatus::Completed);

        // A completed challenge cannot become active again.
        assert!(!a.mark_challenge_active("zero-waste"));
        assert!(!a.active_challenges.contains("zero-waste"));
        assert!(!a.mark_challenge_completed("zero-waste"));
    }

    #[test]
    fn impact_delta_skips_absent_fields() {
        let mut a = UserAccount::new();
        a.add_impact(&ImpactDelta {
            co2_saved: Some(5),
            water_saved: Some(42),
            energy_saved: None,
        });
        a.add_impact(&ImpactDelta {
            co2_saved: Some(25),
            ..Default::default()
        });
        assert_eq!(a.impact.co2_saved, 30);
        assert_eq!(a.impact.water_saved, 42);
        assert_eq!(a.impact.energy_saved, 0);
        assert!(ImpactDelta::default().is_empty());
    }

    #[test]
    fn partial_record_fills_defaults() {
        let a: UserAccount = serde_json::from_str(r#"{"points": 40, "badges": ["x"]}"#).unwrap();
        assert_eq!(a.points, 40);
        assert!(a.badges.contains("x"));
        assert!(a.active_challenges.is_empty());
        assert_eq!(a.level, 1);
    }
}
