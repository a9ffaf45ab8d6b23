//! Placement agent — where is this learner on the tier axis right now?
//!
//! The estimate moves a little after every answer: up on correct answers
//! (less when slow), down harder on misses. Step size shrinks as confidence
//! grows, so a well-measured learner is not jerked around by one answer.
//!
//! Confidence is `sample × consistency`:
//! - `sample = n / (n + prior_weight)` grows with answered questions
//! - `consistency` drops with correctness variance and latency spread in
//!   the rolling window
//!
//! The estimate is session-local. Only the session-end advancement rule
//! may change the persisted tier.

use mathtier_config::PlacementConfig;
use mathtier_core::tier::{MAX_TIER, MIN_TIER, clamp_tier, tier_to_difficulty};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// One observed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSample {
    pub correct: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementAgent {
    estimated_tier: f64,
    confidence: f64,
    answered: u32,
    window: VecDeque<AnswerSample>,
}

/// What the placement agent contributes to the directive envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementDirective {
    pub estimated_tier: u8,
    pub confidence: f64,
    pub target_difficulty: f64,
}

impl PlacementAgent {
    pub fn new(starting_tier: u8) -> Self {
        Self {
            estimated_tier: clamp_tier(starting_tier as i64) as f64,
            confidence: 0.0,
            answered: 0,
            window: VecDeque::new(),
        }
    }

    /// Fold one answer into the estimate.
    pub fn record(&mut self, correct: bool, latency_ms: u64, config: &PlacementConfig) {
        let capacity = config.window_size.max(1);
        while self.window.len() >= capacity {
            self.window.pop_front();
        }
        self.window.push_back(AnswerSample { correct, latency_ms });
        self.answered = self.answered.saturating_add(1);

        let step = config.base_step * (1.0 - 0.5 * self.confidence);
        let delta = match (correct, latency_ms <= config.fast_latency_ms) {
            (true, true) => step,
            (true, false) => step / 2.0,
            (false, _) => -step * config.miss_weight,
        };
        self.estimated_tier =
            (self.estimated_tier + delta).clamp(MIN_TIER as f64, MAX_TIER as f64);
        self.confidence = self.compute_confidence(config);

        debug!(
            correct,
            latency_ms,
            estimated_tier = self.estimated_tier,
            confidence = self.confidence,
            "Placement updated"
        );
    }

    fn compute_confidence(&self, config: &PlacementConfig) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let n = self.answered as f64;
        let sample = n / (n + config.prior_weight.max(f64::EPSILON));

        // p(1-p) peaks at 0.25 for a coin-flip window
        let p = self.window_accuracy().unwrap_or(0.0);
        let accuracy_variance = (p * (1.0 - p)) / 0.25;

        let consistency = 1.0
            - config.accuracy_variance_weight * accuracy_variance
            - config.latency_variance_weight * self.latency_cv().min(1.0);

        (sample * consistency.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }

    /// Coefficient of variation of window latencies; 0 when undefined.
    fn latency_cv(&self) -> f64 {
        let Some(mean) = self.mean_latency_ms() else {
            return 0.0;
        };
        if mean <= 0.0 {
            return 0.0;
        }
        let var = self
            .window
            .iter()
            .map(|s| (s.latency_ms as f64 - mean).powi(2))
            .sum::<f64>()
            / self.window.len() as f64;
        var.sqrt() / mean
    }

    /// The estimate rounded onto the tier axis.
    pub fn estimated_tier(&self) -> u8 {
        clamp_tier(self.estimated_tier.round() as i64)
    }

    pub fn raw_estimate(&self) -> f64 {
        self.estimated_tier
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn window(&self) -> impl Iterator<Item = &AnswerSample> {
        self.window.iter()
    }

    pub fn window_accuracy(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let correct = self.window.iter().filter(|s| s.correct).count();
        Some(correct as f64 / self.window.len() as f64)
    }

    pub fn mean_latency_ms(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let total: f64 = self.window.iter().map(|s| s.latency_ms as f64).sum();
        Some(total / self.window.len() as f64)
    }

    pub fn target_difficulty(&self) -> f64 {
        tier_to_difficulty(self.estimated_tier() as i64)
    }

    pub fn directive(&self) -> PlacementDirective {
        PlacementDirective {
            estimated_tier: self.estimated_tier(),
            confidence: self.confidence,
            target_difficulty: self.target_difficulty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathtier_core::tier::difficulty_to_tier;

    fn config() -> PlacementConfig {
        PlacementConfig::default()
    }

    #[test]
    fn starts_at_persisted_tier_with_zero_confidence() {
        let agent = PlacementAgent::new(37);
        assert_eq!(agent.estimated_tier(), 37);
        assert_eq!(agent.confidence(), 0.0);
        assert_eq!(difficulty_to_tier(agent.target_difficulty()), 37);
        assert!(agent.window_accuracy().is_none());
    }

    #[test]
    fn confidence_rises_monotonically_on_homogeneous_input() {
        let cfg = config();
        let mut agent = PlacementAgent::new(30);
        let mut prev = 0.0;
        for _ in 0..60 {
            agent.record(true, 3_000, &cfg);
            let c = agent.confidence();
            assert!((0.0..=1.0).contains(&c));
            assert!(c >= prev, "confidence dropped from {prev} to {c}");
            prev = c;
        }
        assert!(prev > 0.95);
    }

    #[test]
    fn mixed_answers_lower_confidence() {
        let cfg = config();
        let mut steady = PlacementAgent::new(30);
        let mut shaky = PlacementAgent::new(30);
        for i in 0..20 {
            steady.record(true, 3_000, &cfg);
            shaky.record(i % 2 == 0, if i % 3 == 0 { 1_000 } else { 12_000 }, &cfg);
        }
        assert!(shaky.confidence() < steady.confidence());
    }

    #[test]
    fn estimate_moves_with_performance() {
        let cfg = config();
        let mut up = PlacementAgent::new(40);
        let mut down = PlacementAgent::new(40);
        for _ in 0..5 {
            up.record(true, 2_000, &cfg);
            down.record(false, 2_000, &cfg);
        }
        assert!(up.raw_estimate() > 40.0);
        assert!(down.raw_estimate() < 40.0);
    }

    #[test]
    fn slow_correct_moves_less_than_fast_correct() {
        let cfg = config();
        let mut fast = PlacementAgent::new(40);
        let mut slow = PlacementAgent::new(40);
        fast.record(true, 1_000, &cfg);
        slow.record(true, 20_000, &cfg);
        assert!(fast.raw_estimate() > slow.raw_estimate());
    }

    #[test]
    fn estimate_is_clamped() {
        let cfg = config();
        let mut agent = PlacementAgent::new(1);
        for _ in 0..10 {
            agent.record(false, 2_000, &cfg);
        }
        assert_eq!(agent.estimated_tier(), 1);
    }

    #[test]
    fn window_is_bounded() {
        let cfg = PlacementConfig {
            window_size: 4,
            ..config()
        };
        let mut agent = PlacementAgent::new(10);
        for _ in 0..9 {
            agent.record(true, 2_000, &cfg);
        }
        assert_eq!(agent.window().count(), 4);
        assert_eq!(agent.answered(), 9);
    }
}
