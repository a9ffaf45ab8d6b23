//! The stored learner profile shared by the reference learner stores.

use chrono::{DateTime, Utc};
use mathtier_core::{MathTiers, Operation, TierUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A milestone already paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditedMilestone {
    pub operation: Operation,
    pub tier: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub user_id: String,
    #[serde(default)]
    pub math_tiers: MathTiers,
    /// Answers toward the next tier; reset on every tier change.
    #[serde(default)]
    pub skill_progress: HashMap<Operation, u32>,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub credited_milestones: Vec<CreditedMilestone>,
    pub updated_at: DateTime<Utc>,
}

impl LearnerProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            math_tiers: MathTiers::default(),
            skill_progress: HashMap::new(),
            coins: 0,
            xp: 0,
            credited_milestones: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_tiers(mut self, tiers: MathTiers) -> Self {
        self.math_tiers = tiers;
        self
    }

    /// Apply a tier update. Returns whether a milestone reward was credited.
    pub fn apply(&mut self, update: &TierUpdate) -> bool {
        self.math_tiers.set(update.operation, update.new_tier);
        self.skill_progress.insert(update.operation, 0);
        self.updated_at = Utc::now();

        let Some(milestone) = &update.milestone else {
            return false;
        };
        let key = CreditedMilestone {
            operation: update.operation,
            tier: milestone.tier,
        };
        if self.credited_milestones.contains(&key) {
            return false;
        }
        self.coins += milestone.reward.coins as u64;
        self.xp += milestone.reward.xp as u64;
        self.credited_milestones.push(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathtier_core::progression::milestone_for_tier;

    #[test]
    fn milestone_credited_once() {
        let mut profile = LearnerProfile::new("learner");
        let update = TierUpdate {
            operation: Operation::Addition,
            new_tier: 20,
            milestone: milestone_for_tier(20),
        };
        assert!(profile.apply(&update));
        assert!(!profile.apply(&update));
        assert_eq!(profile.coins, 1000);
        assert_eq!(profile.xp, 2000);
        assert_eq!(profile.math_tiers.addition, 20);
        assert_eq!(profile.skill_progress[&Operation::Addition], 0);
    }

    #[test]
    fn missing_fields_default() {
        let json = r#"{
            "user_id": "u1",
            "math_tiers": {"addition": "12"},
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let profile: LearnerProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.math_tiers.addition, 12);
        assert_eq!(profile.math_tiers.division, 1);
        assert_eq!(profile.coins, 0);
    }
}
