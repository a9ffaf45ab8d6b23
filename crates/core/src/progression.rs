//! Tier progression rules: milestone rewards, mastery-test gating, and the
//! session-end advancement decision with band-boundary capping.
//!
//! Everything here is pure so it can be tested without a live session.

use serde::{Deserialize, Serialize};

use crate::tier::{Band, MAX_TIER, MIN_TIER, clamp_tier, get_band_for_tier, is_at_band_boundary};

// ── Milestones ────────────────────────────────────────────────────────────

/// Tiers at which milestones sit.
pub const MILESTONE_INTERVAL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReward {
    pub coins: u32,
    pub xp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub tier: u8,
    pub title: String,
    pub reward: MilestoneReward,
    /// True for the band-completion milestones at 20/40/60/80/100.
    pub completes_band: bool,
}

/// The milestone sitting at `tier`, if any.
pub fn milestone_for_tier(tier: u8) -> Option<Milestone> {
    if tier < MIN_TIER || tier > MAX_TIER || tier % MILESTONE_INTERVAL != 0 {
        return None;
    }
    let t = tier as u32;
    let milestone = if is_at_band_boundary(tier as i64) {
        let band = get_band_for_tier(tier as i64);
        let n = band.number() as u32;
        Milestone {
            tier,
            title: format!("{} complete", band.name()),
            reward: MilestoneReward { coins: 1000 * n, xp: 2000 * n },
            completes_band: true,
        }
    } else if tier % 10 == 0 {
        Milestone {
            tier,
            title: format!("Tier {tier}"),
            reward: MilestoneReward { coins: 100 + 5 * t, xp: 200 + 10 * t },
            completes_band: false,
        }
    } else {
        Milestone {
            tier,
            title: format!("Tier {tier}"),
            reward: MilestoneReward { coins: 50 + 2 * t, xp: 100 + 5 * t },
            completes_band: false,
        }
    };
    Some(milestone)
}

/// The full milestone table, ascending by tier.
pub fn all_milestones() -> Vec<Milestone> {
    (MIN_TIER..=MAX_TIER).filter_map(milestone_for_tier).collect()
}

/// Every milestone in `(prev, next]`, ascending. Empty when `next <= prev`.
pub fn get_all_milestones_crossed(prev: i64, next: i64) -> Vec<Milestone> {
    if next <= prev {
        return Vec::new();
    }
    let lo = clamp_tier(prev.saturating_add(1));
    let hi = clamp_tier(next);
    if prev >= MAX_TIER as i64 {
        return Vec::new();
    }
    (lo..=hi).filter_map(milestone_for_tier).collect()
}

/// The single highest milestone in `(prev, next]`, or `None` when
/// `next <= prev` or nothing lies in between.
pub fn check_milestone_reward(prev: i64, next: i64) -> Option<Milestone> {
    get_all_milestones_crossed(prev, next).pop()
}

// ── Mastery tests ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteryTestRequirements {
    pub tier: u8,
    pub question_count: u32,
    pub required_accuracy: f64,
    pub time_limit_secs: u32,
    /// Passing this test promotes the learner into the next band.
    pub crosses_band: bool,
}

/// Mastery tests are offered only at multiples of 10. Tests that also
/// cross a band boundary are longer and stricter.
pub fn get_mastery_test_requirements(tier: i64) -> Option<MasteryTestRequirements> {
    if !(MIN_TIER as i64..=MAX_TIER as i64).contains(&tier) || tier % 10 != 0 {
        return None;
    }
    let crosses_band = can_attempt_band_promotion(tier);
    Some(if crosses_band {
        MasteryTestRequirements {
            tier: tier as u8,
            question_count: 30,
            required_accuracy: 0.90,
            time_limit_secs: 420,
            crosses_band,
        }
    } else {
        MasteryTestRequirements {
            tier: tier as u8,
            question_count: 20,
            required_accuracy: 0.85,
            time_limit_secs: 300,
            crosses_band,
        }
    })
}

/// Band promotion is possible from every boundary tier except the last.
pub fn can_attempt_band_promotion(tier: i64) -> bool {
    is_at_band_boundary(tier) && tier < MAX_TIER as i64
}

// ── Advancement ───────────────────────────────────────────────────────────

pub const MIN_QUESTIONS_FOR_ADVANCEMENT: u32 = 10;
pub const MIN_ACCURACY_FOR_ADVANCEMENT: f64 = 0.85;
pub const MAX_TILT_FOR_ADVANCEMENT: f64 = 0.5;

/// Whole-session performance used by the advancement decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancementInput {
    pub accuracy: f64,
    pub total_questions: u32,
    pub max_streak: u32,
    pub tilt_score: f64,
    pub confidence: f64,
}

impl AdvancementInput {
    /// Accuracy and tilt are finite and within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.accuracy) && unit.contains(&self.tilt_score)
    }
}

/// Number of tiers (0–3) earned by a session. Invalid input earns nothing.
pub fn calculate_tier_advancement(input: &AdvancementInput) -> u8 {
    if !input.is_valid()
        || input.total_questions < MIN_QUESTIONS_FOR_ADVANCEMENT
        || input.accuracy < MIN_ACCURACY_FOR_ADVANCEMENT
        || input.tilt_score >= MAX_TILT_FOR_ADVANCEMENT
    {
        return 0;
    }

    let calm = input.tilt_score < 0.3;
    if calm && input.accuracy >= 0.95 && input.confidence >= 0.90 && input.max_streak >= 10 {
        3
    } else if calm && input.accuracy >= 0.90 && input.confidence >= 0.85 && input.max_streak >= 8
    {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedAdvancement {
    pub new_tier: u8,
    pub tiers_gained: u8,
    pub blocked_by_band_boundary: bool,
}

/// Apply `gained` tiers to `current`, truncating at the current band's
/// upper bound. Crossing into the next band requires a mastery test. The
/// last band has no next band, so truncation at 100 is never reported as
/// blocked.
pub fn cap_at_band_boundary(current: u8, gained: u8) -> CappedAdvancement {
    let current = current.clamp(MIN_TIER, MAX_TIER);
    let boundary = get_band_for_tier(current as i64).max_tier();
    let proposed = current as u16 + gained as u16;
    let new_tier = proposed.min(boundary as u16) as u8;
    CappedAdvancement {
        new_tier,
        tiers_gained: new_tier - current,
        blocked_by_band_boundary: proposed > boundary as u16 && boundary < MAX_TIER,
    }
}

/// Outcome of the session-end tier decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProgression {
    pub previous_tier: u8,
    pub new_tier: u8,
    pub advanced: bool,
    pub tiers_gained: u8,
    pub band_name: String,
    pub blocked_by_band_boundary: bool,
    /// The highest milestone reached, awarded once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    /// Every milestone in `(previous_tier, new_tier]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones_crossed: Vec<Milestone>,
}

impl TierProgression {
    /// Decide the new tier for a learner currently at `current_tier`.
    pub fn evaluate(current_tier: u8, input: &AdvancementInput) -> Self {
        let previous_tier = current_tier.clamp(MIN_TIER, MAX_TIER);
        let gained = calculate_tier_advancement(input);
        let capped = if gained == 0 {
            CappedAdvancement {
                new_tier: previous_tier,
                tiers_gained: 0,
                blocked_by_band_boundary: false,
            }
        } else {
            cap_at_band_boundary(previous_tier, gained)
        };

        let milestones_crossed =
            get_all_milestones_crossed(previous_tier as i64, capped.new_tier as i64);
        let band: Band = get_band_for_tier(capped.new_tier as i64);

        Self {
            previous_tier,
            new_tier: capped.new_tier,
            advanced: capped.new_tier > previous_tier,
            tiers_gained: capped.tiers_gained,
            band_name: band.name().to_string(),
            blocked_by_band_boundary: capped.blocked_by_band_boundary,
            milestone: milestones_crossed.last().cloned(),
            milestones_crossed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(accuracy: f64, confidence: f64, max_streak: u32, tilt_score: f64) -> AdvancementInput {
        AdvancementInput {
            accuracy,
            total_questions: 25,
            max_streak,
            tilt_score,
            confidence,
        }
    }

    #[test]
    fn milestone_none_when_not_advancing() {
        assert!(check_milestone_reward(20, 20).is_none());
        assert!(check_milestone_reward(30, 12).is_none());
    }

    #[test]
    fn milestone_returns_highest_in_range() {
        let m = check_milestone_reward(3, 12).unwrap();
        assert_eq!(m.tier, 10);
        let m = check_milestone_reward(19, 20).unwrap();
        assert_eq!(m.tier, 20);
        assert!(m.completes_band);
        // prev is exclusive
        assert!(check_milestone_reward(20, 24).is_none());
    }

    #[test]
    fn milestones_crossed_from_one_to_twenty() {
        let tiers: Vec<u8> = get_all_milestones_crossed(1, 20).iter().map(|m| m.tier).collect();
        assert!(tiers.contains(&5));
        assert!(tiers.contains(&10));
        assert!(tiers.contains(&20));
    }

    #[test]
    fn band_completion_is_largest_reward_in_band() {
        for band in Band::ALL {
            let completion = milestone_for_tier(band.max_tier()).unwrap();
            let others = all_milestones()
                .into_iter()
                .filter(|m| band.contains(m.tier) && !m.completes_band);
            for m in others {
                assert!(completion.reward.coins > m.reward.coins);
                assert!(completion.reward.xp > m.reward.xp);
            }
        }
    }

    #[test]
    fn mastery_tests_only_at_multiples_of_ten() {
        assert!(get_mastery_test_requirements(15).is_none());
        assert!(get_mastery_test_requirements(0).is_none());
        let plain = get_mastery_test_requirements(30).unwrap();
        let crossing = get_mastery_test_requirements(40).unwrap();
        assert!(!plain.crosses_band);
        assert!(crossing.crosses_band);
        assert!(crossing.question_count > plain.question_count);
        assert!(crossing.required_accuracy > plain.required_accuracy);
        assert!(!get_mastery_test_requirements(100).unwrap().crosses_band);
    }

    #[test]
    fn band_promotion_only_below_hundred() {
        assert!(can_attempt_band_promotion(20));
        assert!(can_attempt_band_promotion(80));
        assert!(!can_attempt_band_promotion(100));
        assert!(!can_attempt_band_promotion(50));
    }

    #[test]
    fn no_advancement_below_accuracy_floor() {
        assert_eq!(calculate_tier_advancement(&input(0.84, 1.0, 30, 0.0)), 0);
    }

    #[test]
    fn no_advancement_when_tilted_or_short() {
        assert_eq!(calculate_tier_advancement(&input(1.0, 1.0, 30, 0.5)), 0);
        let short = AdvancementInput {
            total_questions: 9,
            ..input(1.0, 1.0, 9, 0.0)
        };
        assert_eq!(calculate_tier_advancement(&short), 0);
    }

    #[test]
    fn advancement_scales_with_performance() {
        let one = calculate_tier_advancement(&input(0.85, 0.80, 5, 0.2));
        let two = calculate_tier_advancement(&input(0.90, 0.85, 8, 0.2));
        let three = calculate_tier_advancement(&input(0.95, 0.90, 10, 0.2));
        assert_eq!((one, two, three), (1, 2, 3));
    }

    #[test]
    fn capping_truncates_at_boundary() {
        let c = cap_at_band_boundary(59, 3);
        assert_eq!(c.new_tier, 60);
        assert_eq!(c.tiers_gained, 1);
        assert!(c.blocked_by_band_boundary);

        let c = cap_at_band_boundary(50, 3);
        assert_eq!(c.new_tier, 53);
        assert!(!c.blocked_by_band_boundary);

        let c = cap_at_band_boundary(60, 2);
        assert_eq!(c.new_tier, 60);
        assert_eq!(c.tiers_gained, 0);
        assert!(c.blocked_by_band_boundary);

        let c = cap_at_band_boundary(99, 3);
        assert_eq!(c.new_tier, 100);
        assert!(!c.blocked_by_band_boundary);
    }

    #[test]
    fn top_tier_is_never_blocked() {
        let c = cap_at_band_boundary(100, 2);
        assert_eq!(c.new_tier, 100);
        assert_eq!(c.tiers_gained, 0);
        assert!(!c.blocked_by_band_boundary);

        let p = TierProgression::evaluate(100, &input(0.96, 0.95, 10, 0.1));
        assert!(!p.advanced);
        assert!(!p.blocked_by_band_boundary);
    }

    #[test]
    fn non_finite_or_out_of_range_stats_earn_nothing() {
        let nan = TierProgression::evaluate(30, &input(f64::NAN, 0.0, 0, f64::NAN));
        assert_eq!(nan.new_tier, 30);
        assert_eq!(calculate_tier_advancement(&input(f64::NAN, 1.0, 30, 0.0)), 0);
        assert_eq!(calculate_tier_advancement(&input(1.0, 1.0, 30, f64::NAN)), 0);
        assert_eq!(calculate_tier_advancement(&input(f64::INFINITY, 1.0, 30, 0.0)), 0);
        assert_eq!(calculate_tier_advancement(&input(1.5, 1.0, 30, 0.0)), 0);
        assert_eq!(calculate_tier_advancement(&input(1.0, 1.0, 30, -0.2)), 0);
        assert!(input(1.0, 1.0, 30, 0.0).is_valid());
    }

    #[test]
    fn progression_awards_boundary_milestone_once() {
        let p = TierProgression::evaluate(59, &input(0.96, 0.95, 10, 0.1));
        assert_eq!(p.new_tier, 60);
        assert!(p.blocked_by_band_boundary);
        assert_eq!(p.milestone.as_ref().map(|m| m.tier), Some(60));
        assert_eq!(p.milestones_crossed.len(), 1);
        assert_eq!(p.band_name, "Advanced");
    }

    #[test]
    fn progression_unchanged_without_advancement() {
        let p = TierProgression::evaluate(42, &input(0.5, 0.5, 2, 0.9));
        assert_eq!(p.new_tier, 42);
        assert!(!p.advanced);
        assert!(p.milestone.is_none());
    }
}
