//! Session-scoped orchestrator state.

use mathtier_agents::{CoachAgent, EchoAgent, PlacementAgent};
use mathtier_config::PracticeConfig;
use mathtier_core::tier::clamp_tier;
use mathtier_core::{ContentItem, FactKey, MathTiers, Operation};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Active,
    Ended,
}

/// The learner as seen from inside one session, for one operation.
///
/// `current_tier` is the persisted tier the session started from. It only
/// changes through the session-end advancement rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerModel {
    pub operation: Operation,
    pub current_tier: u8,
    pub confidence: f64,
    pub recent_accuracy: VecDeque<bool>,
    pub recent_latency_ms: VecDeque<u64>,
}

impl LearnerModel {
    pub fn new(operation: Operation, current_tier: u8) -> Self {
        Self {
            operation,
            current_tier: clamp_tier(current_tier as i64),
            confidence: 0.0,
            recent_accuracy: VecDeque::new(),
            recent_latency_ms: VecDeque::new(),
        }
    }

    pub fn record(&mut self, correct: bool, latency_ms: u64, confidence: f64, window: usize) {
        let window = window.max(1);
        push_bounded(&mut self.recent_accuracy, correct, window);
        push_bounded(&mut self.recent_latency_ms, latency_ms, window);
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    pub fn recent_accuracy(&self) -> Option<f64> {
        if self.recent_accuracy.is_empty() {
            return None;
        }
        let correct = self.recent_accuracy.iter().filter(|c| **c).count();
        Some(correct as f64 / self.recent_accuracy.len() as f64)
    }
}

/// Running counters for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub answered: u32,
    pub correct: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub hints_used: u32,
    pub echo_presented: u32,
}

impl SessionStats {
    pub fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
            self.current_streak += 1;
            self.max_streak = self.max_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub session_id: String,
    pub user_id: String,
    pub operation: Operation,
    #[serde(default)]
    pub phase: SessionPhase,
    pub question_number: u32,
    pub current_item: Option<ContentItem>,
    /// Whether `current_item` came out of the echo queue.
    #[serde(default)]
    pub current_from_echo: bool,
    /// Facts served recently, newest last.
    pub recent_items: VecDeque<FactKey>,
    /// Hint texts already shown for the pending item.
    pub hints_for_current: Vec<String>,
    pub learner_model: LearnerModel,
    pub placement: PlacementAgent,
    pub coach: CoachAgent,
    pub echo: EchoAgent,
    pub stats: SessionStats,
    pub config: PracticeConfig,
}

impl OrchestratorState {
    /// Fresh state for a learner starting `operation` at their stored tier.
    pub fn initialize(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        operation: Operation,
        tiers: &MathTiers,
        config: PracticeConfig,
    ) -> Self {
        let tier = tiers.get(operation);
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            operation,
            phase: SessionPhase::Active,
            question_number: 0,
            current_item: None,
            current_from_echo: false,
            recent_items: VecDeque::with_capacity(config.recent_items),
            hints_for_current: Vec::new(),
            learner_model: LearnerModel::new(operation, tier),
            placement: PlacementAgent::new(tier),
            coach: CoachAgent::new(),
            echo: EchoAgent::new(),
            stats: SessionStats::default(),
            config,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub(crate) fn remember(&mut self, fact: FactKey) {
        push_bounded(&mut self.recent_items, fact, self.config.recent_items.max(1));
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}
