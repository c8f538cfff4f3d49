//! Static challenge catalog.
//!
//! Immutable reference data: every call returns the same ordered task list.
//! Nothing is added, removed or reordered at runtime.

use serde::Serialize;

use crate::task::{ProofKind, Task};

pub const WATER_CONSERVATION: &str = "water-conservation";
pub const ZERO_WASTE: &str = "zero-waste";

/// Challenge identifiers in catalog order.
pub const CHALLENGE_IDS: &[&str] = &[WATER_CONSERVATION, ZERO_WASTE];

/// Display and reward metadata for a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub difficulty: Difficulty,
    pub duration_days: u32,
    /// Advertised point budget shown to the user.
    pub total_points: u32,
    /// kg of CO2 credited once when the challenge is completed.
    pub completion_co2: u64,
    /// Points credited once when the challenge is completed, on top of task points.
    pub completion_bonus: u32,
    /// Whether each completed task adds a random amount of water saved.
    pub tracks_water: bool,
}

impl ChallengeInfo {
    /// Badge granted when this challenge is completed.
    pub fn badge_id(&self) -> String {
        badge_id(self.id)
    }
}

pub fn badge_id(challenge_id: &str) -> String {
    format!("{challenge_id}-complete")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Special,
}

struct TaskDef {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    instructions: &'static str,
    proof_kind: ProofKind,
    points: u32,
    educational_tip: &'static str,
}

impl TaskDef {
    fn to_task(&self, day_number: u32) -> Task {
        Task {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            instructions: self.instructions.to_string(),
            proof_kind: self.proof_kind,
            points: self.points,
            educational_tip: self.educational_tip.to_string(),
            day_number,
            completed: false,
            locked: day_number > 1,
        }
    }
}

const CHALLENGES: &[ChallengeInfo] = &[
    ChallengeInfo {
        id: WATER_CONSERVATION,
        title: "Water Conservation Master",
        description: "6-day challenge with daily unlocking tasks to master water conservation",
        icon: "💧",
        difficulty: Difficulty::Special,
        duration_days: 6,
        total_points: 180,
        completion_co2: 5,
        completion_bonus: 0,
        tracks_water: true,
    },
    ChallengeInfo {
        id: ZERO_WASTE,
        title: "Zero Waste Week",
        description: "7-day challenge to achieve zero waste through mindful consumption",
        icon: "♻️",
        difficulty: Difficulty::Hard,
        duration_days: 7,
        total_points: 300,
        completion_co2: 25,
        completion_bonus: 0,
        tracks_water: false,
    },
];

const WATER_TASKS: &[TaskDef] = &[
    TaskDef {
        id: "tooth-brushing",
        title: "Tooth Brushing Timer",
        description: "Turn off tap while brushing teeth",
        instructions: "Brush your teeth with the tap turned off. Turn on only to rinse. Time yourself and track water saved!",
        proof_kind: ProofKind::Photo,
        points: 30,
        educational_tip: "Leaving the tap running while brushing can waste up to 8 liters of water per session!",
    },
    TaskDef {
        id: "bowl-washing",
        title: "Bowl Fruit Washing",
        description: "Wash fruits in a bowl instead of running tap",
        instructions: "Fill a bowl with water to wash your fruits and vegetables instead of letting the tap run.",
        proof_kind: ProofKind::Photo,
        points: 30,
        educational_tip: "Using a bowl can save up to 6 liters of water compared to running the tap continuously.",
    },
    TaskDef {
        id: "shower-challenge",
        title: "Shower Challenge",
        description: "5-minute showers with music timer",
        instructions: "Take a 5-minute shower. Play your favorite song as a timer - most songs are 3-5 minutes!",
        proof_kind: ProofKind::Data,
        points: 30,
        educational_tip: "A 5-minute shower uses about 40 liters of water, while a 10-minute shower uses 80 liters.",
    },
    TaskDef {
        id: "laundry-tracking",
        title: "Laundry Tracking",
        description: "Wait for full loads before washing",
        instructions: "Only run your washing machine when you have a full load. Track how many days you wait.",
        proof_kind: ProofKind::Data,
        points: 30,
        educational_tip: "Running full loads can save up to 1,600 liters of water per month!",
    },
    TaskDef {
        id: "dishwashing-method",
        title: "Dishwashing Method",
        description: "Fill sink vs running water",
        instructions: "Fill your sink with soapy water for washing dishes instead of running water continuously.",
        proof_kind: ProofKind::Photo,
        points: 30,
        educational_tip: "Washing dishes in a filled sink uses 50% less water than running the tap continuously.",
    },
    TaskDef {
        id: "share-tip",
        title: "Share Your Tip",
        description: "Share a creative water-saving idea",
        instructions: "Come up with and share your own creative water-saving tip that others can use!",
        proof_kind: ProofKind::Text,
        points: 30,
        educational_tip: "Sharing knowledge multiplies impact - one great tip can save thousands of liters across many households!",
    },
];

const ZERO_WASTE_TASKS: &[TaskDef] = &[
    TaskDef {
        id: "refuse-plastic",
        title: "Refuse Single-Use Plastics",
        description: "Avoid all single-use plastic items today",
        instructions: "Say no to plastic bags, straws, utensils, and containers. Document your alternatives!",
        proof_kind: ProofKind::Photo,
        points: 43,
        educational_tip: "The average person uses 200 single-use plastic items per week.",
    },
    TaskDef {
        id: "start-composting",
        title: "Start Composting",
        description: "Begin composting food scraps",
        instructions: "Set up a simple composting system for your food waste. Even a small container works!",
        proof_kind: ProofKind::Photo,
        points: 43,
        educational_tip: "Composting can reduce household waste by up to 30%.",
    },
    TaskDef {
        id: "trash-audit",
        title: "Conduct Trash Audit",
        description: "Weigh and categorize your waste",
        instructions: "Weigh your trash before disposal and categorize it by type. Record the weights.",
        proof_kind: ProofKind::Data,
        points: 43,
        educational_tip: "The average person produces 4.5 pounds of waste per day.",
    },
    TaskDef {
        id: "upcycling-project",
        title: "DIY Upcycling Project",
        description: "Transform waste into something useful",
        instructions: "Create something useful from items you would normally throw away. Show before and after!",
        proof_kind: ProofKind::Photo,
        points: 43,
        educational_tip: "Upcycling keeps materials in use and reduces the need for new resources.",
    },
    TaskDef {
        id: "buy-nothing",
        title: "Buy Nothing New Day",
        description: "Avoid purchasing any new items",
        instructions: "For one full day, buy nothing new. Use what you have or borrow if needed.",
        proof_kind: ProofKind::Text,
        points: 43,
        educational_tip: "Manufacturing new products often uses 10x more energy than repairing or reusing existing ones.",
    },
    TaskDef {
        id: "clothing-swap",
        title: "Organize Clothing Swap",
        description: "Trade clothes with friends/family",
        instructions: "Organize a clothing swap with friends or family. Give away items you don't wear.",
        proof_kind: ProofKind::Photo,
        points: 43,
        educational_tip: "The fashion industry produces 20% of global wastewater and 10% of carbon emissions.",
    },
    TaskDef {
        id: "zero-waste-kit",
        title: "Create Zero Waste Kit",
        description: "Assemble portable zero waste supplies",
        instructions: "Create a kit with reusable utensils, bags, and containers for when you're out.",
        proof_kind: ProofKind::Photo,
        points: 43,
        educational_tip: "Being prepared prevents 90% of single-use plastic consumption when away from home.",
    },
];

fn task_defs(challenge_id: &str) -> &'static [TaskDef] {
    match challenge_id {
        WATER_CONSERVATION => WATER_TASKS,
        ZERO_WASTE => ZERO_WASTE_TASKS,
        _ => &[],
    }
}

/// Ordered tasks for a challenge, day 1 unlocked. Unknown ids yield an empty list.
pub fn tasks_for(challenge_id: &str) -> Vec<Task> {
    task_defs(challenge_id)
        .iter()
        .zip(1u32..)
        .map(|(def, day)| def.to_task(day))
        .collect()
}

pub fn challenge_info(challenge_id: &str) -> Option<&'static ChallengeInfo> {
    CHALLENGES.iter().find(|c| c.id == challenge_id)
}

pub fn challenges() -> &'static [ChallengeInfo] {
    CHALLENGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_conservation_has_six_thirty_point_tasks() {
        let tasks = tasks_for(WATER_CONSERVATION);
        assert_eq!(tasks.len(), 6);
        assert!(tasks.iter().all(|t| t.points == 30));
        assert_eq!(tasks[0].id, "tooth-brushing");
        assert_eq!(tasks[5].id, "share-tip");
        assert_eq!(tasks[2].proof_kind, ProofKind::Data);
    }

    #[test]
    fn days_are_sequential_from_one() {
        for id in CHALLENGE_IDS {
            let days: Vec<u32> = tasks_for(id).iter().map(|t| t.day_number).collect();
            let expected: Vec<u32> = (1..=days.len() as u32).collect();
            assert_eq!(days, expected, "challenge {id}");
        }
    }

    #[test]
    fn same_sequence_every_call() {
        assert_eq!(tasks_for(ZERO_WASTE), tasks_for(ZERO_WASTE));
    }

    #[test]
    fn unknown_challenge_is_empty() {
        assert!(tasks_for("urban-tree-planter").is_empty());
        assert!(challenge_info("urban-tree-planter").is_none());
    }

    #[test]
    fn every_catalog_challenge_has_info_and_tasks() {
        for id in CHALLENGE_IDS {
            let info = challenge_info(id).expect("info");
            assert_eq!(info.duration_days as usize, tasks_for(id).len());
        }
        assert_eq!(
            challenge_info(WATER_CONSERVATION).unwrap().badge_id(),
            "water-conservation-complete"
        );
    }

    #[test]
    fn only_water_challenge_tracks_water() {
        assert!(challenge_info(WATER_CONSERVATION).unwrap().tracks_water);
        assert!(!challenge_info(ZERO_WASTE).unwrap().tracks_water);
    }
}
