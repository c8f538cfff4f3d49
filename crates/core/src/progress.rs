//! Per-challenge progress record.
//!
//! A `ChallengeProgress` is the unit the progress store persists: the ordered
//! task list with its current flags, the highest unlocked day, and the
//! secondary-impact counter accumulated task by task.

use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub challenge_id: String,
    pub tasks: Vec<Task>,
    /// Highest day whose task has been unlocked.
    pub current_day: u32,
    /// Litres of water saved so far. Only the water challenge accrues this.
    #[serde(default)]
    pub water_saved: u32,
}

impl ChallengeProgress {
    /// Fresh progress: day 1 unlocked, every other day locked, nothing completed.
    pub fn fresh(challenge_id: &str, tasks: Vec<Task>) -> Self {
        let tasks = tasks
            .into_iter()
            .map(|mut t| {
                t.completed = false;
                t.locked = t.day_number > 1;
                t
            })
            .collect();
        ChallengeProgress {
            challenge_id: challenge_id.to_string(),
            tasks,
            current_day: 1,
            water_saved: 0,
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Sum of point values over completed tasks.
    pub fn points_earned(&self) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.points)
            .sum()
    }

    /// Sum of point values over all tasks.
    pub fn points_available(&self) -> u32 {
        self.tasks.iter().map(|t| t.points).sum()
    }

    /// True iff there is at least one task and every task is completed.
    pub fn is_complete(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed)
    }

    /// Completed / total, 0.0 for an empty task list.
    pub fn completion_ratio(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.tasks.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn fresh_unlocks_only_day_one() {
        let p = ChallengeProgress::fresh("zero-waste", catalog::tasks_for("zero-waste"));
        assert_eq!(p.current_day, 1);
        assert_eq!(p.tasks.len(), 7);
        for t in &p.tasks {
            assert!(!t.completed);
            assert_eq!(t.locked, t.day_number != 1, "task {}", t.id);
        }
    }

    #[test]
    fn empty_progress_has_zero_ratio_and_is_not_complete() {
        let p = ChallengeProgress::fresh("nope", vec![]);
        assert_eq!(p.completion_ratio(), 0.0);
        assert!(!p.is_complete());
        assert_eq!(p.points_earned(), 0);
    }

    #[test]
    fn round_trips_through_json() {
        let mut p = ChallengeProgress::fresh(
            "water-conservation",
            catalog::tasks_for("water-conservation"),
        );
        p.tasks[0].completed = true;
        p.tasks[1].locked = false;
        p.current_day = 2;
        p.water_saved = 11;

        let json = serde_json::to_string(&p).unwrap();
        let back: ChallengeProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn points_earned_counts_completed_only() {
        let mut p = ChallengeProgress::fresh(
            "water-conservation",
            catalog::tasks_for("water-conservation"),
        );
        p.tasks[0].completed = true;
        p.tasks[2].completed = true;
        assert_eq!(p.points_earned(), 60);
        assert_eq!(p.points_available(), 180);
        assert_eq!(p.completed_count(), 2);
    }
}
