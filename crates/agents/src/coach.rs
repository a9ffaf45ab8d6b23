//! Coach agent — tilt tracking and recovery.
//!
//! Tilt rises with consecutive misses and slow answers and falls with fast
//! correct streaks. The coach state is an explicit two-state machine with
//! hysteresis:
//!
//! ```text
//!   Normal ──(tilt >= enter_recovery)──▶ Recovering
//!   Recovering ──(tilt < exit_recovery)──▶ Normal
//! ```
//!
//! The gap between the two thresholds keeps one lucky answer from flipping
//! the learner back out of recovery.

use mathtier_config::CoachConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachState {
    #[default]
    Normal,
    Recovering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintFrequency {
    /// Hints only when the learner asks.
    Normal,
    /// Hints offered on every miss.
    Elevated,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoachAgent {
    tilt_score: f64,
    state: CoachState,
    consecutive_misses: u32,
    fast_correct_streak: u32,
}

/// What the coach contributes to the directive envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachDirective {
    pub tilt_score: f64,
    pub state: CoachState,
    pub hint_frequency: HintFrequency,
    /// Tiers to add to the placement target (negative while recovering).
    pub tier_offset: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CoachAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one answer into tilt. Returns the new state when it changed.
    pub fn record(
        &mut self,
        correct: bool,
        latency_ms: u64,
        config: &CoachConfig,
    ) -> Option<CoachState> {
        let slow = latency_ms > config.slow_latency_ms;
        let fast = latency_ms <= config.fast_latency_ms;

        if correct {
            self.consecutive_misses = 0;
            self.fast_correct_streak = if fast { self.fast_correct_streak + 1 } else { 0 };
            self.tilt_score -= config.correct_relief;
            if fast {
                self.tilt_score -= config.streak_relief * self.fast_correct_streak.min(5) as f64;
            }
        } else {
            self.consecutive_misses += 1;
            self.fast_correct_streak = 0;
            let escalation = 1.0 + 0.5 * (self.consecutive_misses - 1).min(3) as f64;
            self.tilt_score += config.miss_penalty * escalation;
        }
        if slow {
            self.tilt_score += config.slow_penalty;
        }
        self.tilt_score = self.tilt_score.clamp(0.0, 1.0);

        let next = match self.state {
            CoachState::Normal if self.tilt_score >= config.enter_recovery => {
                CoachState::Recovering
            }
            CoachState::Recovering if self.tilt_score < config.exit_recovery => {
                CoachState::Normal
            }
            current => current,
        };

        debug!(
            correct,
            latency_ms,
            tilt = self.tilt_score,
            misses = self.consecutive_misses,
            "Coach updated"
        );

        if next != self.state {
            info!(from = ?self.state, to = ?next, tilt = self.tilt_score, "Coach state changed");
            self.state = next;
            Some(next)
        } else {
            None
        }
    }

    pub fn tilt_score(&self) -> f64 {
        self.tilt_score
    }

    pub fn state(&self) -> CoachState {
        self.state
    }

    pub fn is_in_recovery(&self) -> bool {
        self.state == CoachState::Recovering
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    /// Hints are for wrong answers only: when the learner asked, or
    /// whenever the coach is recovering.
    pub fn should_offer_hint(&self, is_correct: bool, help_used: bool) -> bool {
        !is_correct && (help_used || self.is_in_recovery())
    }

    pub fn directive(&self, config: &CoachConfig) -> CoachDirective {
        match self.state {
            CoachState::Normal => CoachDirective {
                tilt_score: self.tilt_score,
                state: self.state,
                hint_frequency: HintFrequency::Normal,
                tier_offset: 0,
                message: None,
            },
            CoachState::Recovering => CoachDirective {
                tilt_score: self.tilt_score,
                state: self.state,
                hint_frequency: HintFrequency::Elevated,
                tier_offset: -(config.recovery_tier_drop as i32),
                message: Some("Let's warm up with a few easier ones.".into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilt_into_recovery(coach: &mut CoachAgent, cfg: &CoachConfig) {
        for _ in 0..6 {
            coach.record(false, 8_000, cfg);
        }
        assert!(coach.is_in_recovery());
    }

    #[test]
    fn misses_raise_tilt_and_enter_recovery() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        assert_eq!(coach.record(false, 4_000, &cfg), None);
        assert!(coach.tilt_score() > 0.0);
        let mut entered = false;
        for _ in 0..5 {
            if coach.record(false, 4_000, &cfg) == Some(CoachState::Recovering) {
                entered = true;
            }
        }
        assert!(entered);
        assert!(coach.tilt_score() <= 1.0);
    }

    #[test]
    fn single_lucky_answer_does_not_exit_recovery() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        tilt_into_recovery(&mut coach, &cfg);
        assert_eq!(coach.record(true, 1_000, &cfg), None);
        assert!(coach.is_in_recovery());
    }

    #[test]
    fn fast_correct_streak_exits_recovery() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        tilt_into_recovery(&mut coach, &cfg);
        let mut exited = false;
        for _ in 0..15 {
            if coach.record(true, 1_500, &cfg) == Some(CoachState::Normal) {
                exited = true;
                break;
            }
        }
        assert!(exited);
        assert!(coach.tilt_score() < cfg.exit_recovery);
    }

    #[test]
    fn slow_answers_add_tilt() {
        let cfg = CoachConfig::default();
        let mut quick = CoachAgent::new();
        let mut slow = CoachAgent::new();
        quick.record(false, 4_000, &cfg);
        slow.record(false, 30_000, &cfg);
        assert!(slow.tilt_score() > quick.tilt_score());
    }

    #[test]
    fn slow_correct_answer_still_earns_relief() {
        let cfg = CoachConfig {
            slow_penalty: 0.05,
            correct_relief: 0.1,
            ..CoachConfig::default()
        };
        let mut coach = CoachAgent::new();
        coach.record(false, 4_000, &cfg);
        let before = coach.tilt_score();
        coach.record(true, 30_000, &cfg);
        let expected = before - cfg.correct_relief + cfg.slow_penalty;
        assert!((coach.tilt_score() - expected).abs() < 1e-9);
    }

    #[test]
    fn tilt_never_goes_negative() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        for _ in 0..10 {
            coach.record(true, 500, &cfg);
        }
        assert_eq!(coach.tilt_score(), 0.0);
    }

    #[test]
    fn recovery_directive_favors_easier_content() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        assert_eq!(coach.directive(&cfg).tier_offset, 0);
        tilt_into_recovery(&mut coach, &cfg);
        let d = coach.directive(&cfg);
        assert_eq!(d.tier_offset, -5);
        assert_eq!(d.hint_frequency, HintFrequency::Elevated);
    }

    #[test]
    fn directive_serializes_snake_case() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        tilt_into_recovery(&mut coach, &cfg);
        let json = serde_json::to_value(coach.directive(&cfg)).unwrap();
        assert_eq!(json["state"], "recovering");
        assert_eq!(json["hint_frequency"], "elevated");
        assert_eq!(json["tier_offset"], -5);
    }

    #[test]
    fn hints_only_on_misses() {
        let cfg = CoachConfig::default();
        let mut coach = CoachAgent::new();
        assert!(!coach.should_offer_hint(true, true));
        assert!(coach.should_offer_hint(false, true));
        assert!(!coach.should_offer_hint(false, false));
        tilt_into_recovery(&mut coach, &cfg);
        assert!(coach.should_offer_hint(false, false));
    }
}
