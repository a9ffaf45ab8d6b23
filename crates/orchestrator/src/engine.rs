//! Turn handling: question selection, answer processing, hints, and the
//! session-end tier decision.

use mathtier_agents::{CoachState, EchoOutcome, HintPayload, get_hint};
use mathtier_content::generate_item;
use mathtier_core::tier::{clamp_tier, difficulty_to_tier};
use mathtier_core::{
    AdvancementInput, ContentItem, Error, Result, TierProgression, TierUpdate, check_answer,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::envelope::{DirectiveEnvelope, Directives, PlacementView, Selection, SelectionSource};
use crate::state::{OrchestratorState, SessionPhase};

/// Redraws allowed when a fresh item repeats a recent fact.
const FRESH_ATTEMPTS: usize = 5;

/// Session performance summary handed in at session end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub accuracy: f64,
    pub total_questions: u32,
    pub max_streak: u32,
    pub tilt_score: f64,
    /// Falls back to the placement agent's confidence when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AggregateStats {
    fn to_input(self, fallback_confidence: f64) -> AdvancementInput {
        AdvancementInput {
            accuracy: self.accuracy,
            total_questions: self.total_questions,
            max_streak: self.max_streak,
            tilt_score: self.tilt_score,
            confidence: self
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(fallback_confidence)
                .clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<HintPayload>,
    pub echo: EchoOutcome,
    /// The item that was answered.
    pub item: ContentItem,
    /// New coach state when this answer flipped it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_transition: Option<CoachState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub progression: TierProgression,
    /// Present only when the tier changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<TierUpdate>,
}

impl OrchestratorState {
    fn ensure_active(&self) -> Result<()> {
        match self.phase {
            SessionPhase::Active => Ok(()),
            SessionPhase::Ended => Err(Error::SessionEnded(self.session_id.clone())),
        }
    }

    /// Select the next item: a due echo item first, otherwise a fresh item
    /// at the placement target shifted by the coach offset.
    pub fn next_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<DirectiveEnvelope> {
        self.ensure_active()?;
        self.question_number += 1;

        let coach = self.coach.directive(&self.config.coach);
        let placement = self.placement.directive();
        let target_tier = clamp_tier(
            difficulty_to_tier(placement.target_difficulty) as i64 + coach.tier_offset as i64,
        );

        // An echo item replaced before it was answered goes back in the queue
        if self.current_from_echo {
            if let Some(pending) = self.current_item.take() {
                self.echo.requeue(&pending.fact());
            }
        }

        let (item, source) = match self.echo.take_due(self.question_number) {
            Some(item) => {
                self.stats.echo_presented += 1;
                (item, SelectionSource::Echo)
            }
            None => (self.fresh_item(target_tier, rng), SelectionSource::Fresh),
        };

        self.remember(item.fact());
        self.current_item = Some(item.clone());
        self.current_from_echo = source == SelectionSource::Echo;
        self.hints_for_current.clear();

        debug!(
            session_id = %self.session_id,
            question = self.question_number,
            target_tier,
            ?source,
            item = %item.equation(),
            "Question selected"
        );

        let echo = self
            .echo
            .directive(self.question_number, source == SelectionSource::Echo);
        Ok(DirectiveEnvelope {
            selection: Selection { item, source },
            directives: Directives {
                placement: PlacementView::new(placement, target_tier),
                coach,
                echo,
            },
        })
    }

    fn fresh_item<R: Rng + ?Sized>(&self, tier: u8, rng: &mut R) -> ContentItem {
        let mut item = generate_item(self.operation, tier, &self.config.content, rng);
        for _ in 1..FRESH_ATTEMPTS {
            if !self.recent_items.contains(&item.fact()) {
                break;
            }
            item = generate_item(self.operation, tier, &self.config.content, rng);
        }
        item
    }

    /// Check an answer to the pending item and update every agent.
    ///
    /// A non-numeric answer is simply wrong.
    pub fn process_answer(
        &mut self,
        user_answer: &str,
        latency_ms: u64,
        help_used: bool,
    ) -> Result<AnswerOutcome> {
        self.ensure_active()?;
        let item = self.current_item.take().ok_or(Error::NoCurrentQuestion)?;
        self.current_from_echo = false;
        let is_correct = check_answer(&item, user_answer);

        self.placement
            .record(is_correct, latency_ms, &self.config.placement);
        self.learner_model.record(
            is_correct,
            latency_ms,
            self.placement.confidence(),
            self.config.placement.window_size,
        );
        let coach_transition = self.coach.record(is_correct, latency_ms, &self.config.coach);

        let echo = if is_correct {
            self.echo
                .record_hit(&item.fact(), self.question_number, &self.config.echo)
        } else {
            self.echo
                .record_miss(&item, self.question_number, &self.config.echo)
        };
        self.stats.record(is_correct);

        let hint = if self.coach.should_offer_hint(is_correct, help_used) {
            self.hint_for(&item, user_answer, latency_ms)
        } else {
            None
        };

        debug!(
            session_id = %self.session_id,
            question = self.question_number,
            is_correct,
            latency_ms,
            tilt = self.coach.tilt_score(),
            ?echo,
            "Answer processed"
        );

        Ok(AnswerOutcome {
            is_correct,
            hint,
            echo,
            item,
            coach_transition,
        })
    }

    /// Next rung of the hint ladder for the pending item. `None` when the
    /// given answer is already correct.
    pub fn request_hint(
        &mut self,
        user_answer: &str,
        latency_ms: u64,
    ) -> Result<Option<HintPayload>> {
        self.ensure_active()?;
        let item = self.current_item.clone().ok_or(Error::NoCurrentQuestion)?;
        Ok(self.hint_for(&item, user_answer, latency_ms))
    }

    /// Hint for an item the caller supplies, e.g. one rebuilt from its
    /// problem text.
    pub fn request_hint_for(
        &mut self,
        item: &ContentItem,
        user_answer: &str,
        latency_ms: u64,
    ) -> Result<Option<HintPayload>> {
        self.ensure_active()?;
        Ok(self.hint_for(item, user_answer, latency_ms))
    }

    fn hint_for(
        &mut self,
        item: &ContentItem,
        user_answer: &str,
        latency_ms: u64,
    ) -> Option<HintPayload> {
        let attempt = self.hints_for_current.len() as u32 + 1;
        let hint = get_hint(
            item,
            user_answer,
            latency_ms,
            attempt,
            &self.hints_for_current,
            &self.config,
        )?;
        self.hints_for_current.push(hint.text.clone());
        self.stats.hints_used += 1;
        Some(hint)
    }

    /// Summary of this session's own counters.
    pub fn aggregate_stats(&self) -> AggregateStats {
        AggregateStats {
            accuracy: self.stats.accuracy(),
            total_questions: self.stats.answered,
            max_streak: self.stats.max_streak,
            tilt_score: self.coach.tilt_score(),
            confidence: None,
        }
    }

    /// Apply the advancement rule and close the session.
    pub fn end_session(&mut self, stats: &AggregateStats) -> Result<SessionOutcome> {
        self.ensure_active()?;
        let input = stats.to_input(self.placement.confidence());
        if !input.is_valid() {
            warn!(
                session_id = %self.session_id,
                accuracy = input.accuracy,
                tilt = input.tilt_score,
                "Ignoring out-of-range session stats"
            );
        }
        let progression = TierProgression::evaluate(self.learner_model.current_tier, &input);

        let update = (progression.new_tier != progression.previous_tier).then(|| TierUpdate {
            operation: self.operation,
            new_tier: progression.new_tier,
            milestone: progression.milestone.clone(),
        });

        self.phase = SessionPhase::Ended;
        self.current_item = None;
        self.current_from_echo = false;

        info!(
            session_id = %self.session_id,
            user_id = %self.user_id,
            operation = %self.operation,
            previous_tier = progression.previous_tier,
            new_tier = progression.new_tier,
            blocked = progression.blocked_by_band_boundary,
            "Session ended"
        );

        Ok(SessionOutcome { progression, update })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathtier_agents::EchoStatus;
    use mathtier_config::PracticeConfig;
    use mathtier_core::{MathTiers, Operation};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(operation: Operation, tier: u8) -> OrchestratorState {
        let mut tiers = MathTiers::default();
        tiers.set(operation, tier);
        OrchestratorState::initialize(
            "sess_t",
            "learner",
            operation,
            &tiers,
            PracticeConfig::default(),
        )
    }

    fn strong_stats() -> AggregateStats {
        AggregateStats {
            accuracy: 0.96,
            total_questions: 25,
            max_streak: 10,
            tilt_score: 0.1,
            confidence: Some(0.95),
        }
    }

    #[test]
    fn first_question_targets_stored_tier() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = state(Operation::Addition, 30);
        let env = s.next_question(&mut rng).unwrap();
        assert_eq!(s.question_number, 1);
        assert_eq!(env.directives.placement.target_tier, 30);
        assert_eq!(env.item().tier_generated, 30);
        assert_eq!(env.selection.source, SelectionSource::Fresh);
        assert_eq!(s.current_item.as_ref(), Some(env.item()));
    }

    #[test]
    fn answer_without_question_is_an_error() {
        let mut s = state(Operation::Addition, 5);
        let err = s.process_answer("4", 1_000, false).unwrap_err();
        assert!(matches!(err, Error::NoCurrentQuestion));
        assert!(matches!(s.request_hint("4", 1_000), Err(Error::NoCurrentQuestion)));
    }

    #[test]
    fn malformed_answer_is_just_wrong() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = state(Operation::Subtraction, 8);
        s.next_question(&mut rng).unwrap();
        let out = s.process_answer("seven-ish", 3_000, false).unwrap();
        assert!(!out.is_correct);
        assert_eq!(s.stats.answered, 1);
        assert!(s.current_item.is_none());
    }

    #[test]
    fn missed_item_comes_back_when_due() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = state(Operation::Division, 12);
        let first = s.next_question(&mut rng).unwrap().selection.item;
        let out = s.process_answer("-1", 3_000, false).unwrap();
        assert_eq!(out.echo, EchoOutcome::Enqueued { due_at_question: 4 });

        for _ in 0..2 {
            let env = s.next_question(&mut rng).unwrap();
            assert!(!env.is_echo());
            let answer = env.item().correct_answer.to_string();
            s.process_answer(&answer, 3_000, false).unwrap();
        }

        let env = s.next_question(&mut rng).unwrap();
        assert!(env.is_echo());
        assert_eq!(env.item().fact(), first.fact());
        assert!(env.directives.echo.presented_echo);
        assert_eq!(s.echo.entry(&first.fact()).unwrap().status, EchoStatus::Due);
        assert_eq!(s.stats.echo_presented, 1);
    }

    #[test]
    fn unanswered_echo_item_is_not_stranded() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = state(Operation::Division, 12);
        let first = s.next_question(&mut rng).unwrap().selection.item;
        s.process_answer("-1", 3_000, false).unwrap();
        for _ in 0..2 {
            let env = s.next_question(&mut rng).unwrap();
            let answer = env.item().correct_answer.to_string();
            s.process_answer(&answer, 3_000, false).unwrap();
        }

        assert!(s.next_question(&mut rng).unwrap().is_echo());
        // Skip past it without answering
        let env = s.next_question(&mut rng).unwrap();
        assert!(env.is_echo());
        assert_eq!(env.item().fact(), first.fact());

        let answer = env.item().correct_answer.to_string();
        let out = s.process_answer(&answer, 2_000, false).unwrap();
        assert!(matches!(out.echo, EchoOutcome::Progressed { hits: 1, .. }));
        assert_eq!(s.echo.due().len(), 0);
    }

    #[test]
    fn recovery_lowers_target_and_offers_hints() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = state(Operation::Multiplication, 50);
        let mut unprompted_hint = false;
        for _ in 0..6 {
            s.next_question(&mut rng).unwrap();
            let out = s.process_answer("0", 9_000, false).unwrap();
            unprompted_hint |= out.hint.is_some();
        }
        assert!(s.coach.is_in_recovery());
        assert!(unprompted_hint);

        let env = s.next_question(&mut rng).unwrap();
        assert_eq!(env.directives.coach.tier_offset, -5);
        assert_eq!(
            env.directives.placement.target_tier,
            s.placement.estimated_tier().saturating_sub(5).max(1)
        );
    }

    #[test]
    fn hints_are_distinct_for_one_item() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = state(Operation::Addition, 20);
        s.next_question(&mut rng).unwrap();
        let mut seen = Vec::new();
        for _ in 0..6 {
            let hint = s.request_hint("", 4_000).unwrap().unwrap();
            assert!(!seen.contains(&hint.text));
            seen.push(hint.text);
        }
        assert_eq!(s.stats.hints_used, 6);
    }

    #[test]
    fn correct_answer_gets_no_hint() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut s = state(Operation::Addition, 20);
        let env = s.next_question(&mut rng).unwrap();
        let answer = env.item().correct_answer.to_string();
        assert!(s.request_hint(&answer, 1_000).unwrap().is_none());
        let out = s.process_answer(&answer, 1_000, true).unwrap();
        assert!(out.is_correct);
        assert!(out.hint.is_none());
    }

    #[test]
    fn strong_session_gains_three_tiers() {
        let mut s = state(Operation::Addition, 50);
        let outcome = s.end_session(&strong_stats()).unwrap();
        assert_eq!(outcome.progression.new_tier, 53);
        assert!(!outcome.progression.blocked_by_band_boundary);
        let update = outcome.update.unwrap();
        assert_eq!(update.new_tier, 53);
        assert!(update.milestone.is_none());
    }

    #[test]
    fn band_boundary_caps_advancement() {
        let mut s = state(Operation::Addition, 59);
        let outcome = s.end_session(&strong_stats()).unwrap();
        assert_eq!(outcome.progression.new_tier, 60);
        assert_eq!(outcome.progression.tiers_gained, 1);
        assert!(outcome.progression.blocked_by_band_boundary);
        assert_eq!(outcome.update.unwrap().milestone.map(|m| m.tier), Some(60));
    }

    #[test]
    fn short_session_keeps_tier() {
        let mut s = state(Operation::Addition, 50);
        let stats = AggregateStats {
            total_questions: 5,
            ..strong_stats()
        };
        let outcome = s.end_session(&stats).unwrap();
        assert!(!outcome.progression.advanced);
        assert!(outcome.update.is_none());
    }

    #[test]
    fn non_finite_stats_keep_tier() {
        let mut s = state(Operation::Addition, 30);
        let stats = AggregateStats {
            accuracy: f64::NAN,
            tilt_score: f64::NAN,
            max_streak: 0,
            confidence: Some(f64::NAN),
            ..strong_stats()
        };
        let outcome = s.end_session(&stats).unwrap();
        assert_eq!(outcome.progression.new_tier, 30);
        assert!(outcome.update.is_none());

        let mut s = state(Operation::Addition, 30);
        let stats = AggregateStats {
            accuracy: 1.7,
            ..strong_stats()
        };
        assert!(s.end_session(&stats).unwrap().update.is_none());
    }

    #[test]
    fn missing_confidence_falls_back_to_placement() {
        let mut s = state(Operation::Addition, 50);
        let stats = AggregateStats {
            confidence: None,
            ..strong_stats()
        };
        // No answers recorded, placement confidence is 0
        let outcome = s.end_session(&stats).unwrap();
        assert_eq!(outcome.progression.tiers_gained, 1);
    }

    #[test]
    fn ended_session_rejects_further_turns() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = state(Operation::Addition, 10);
        s.end_session(&strong_stats()).unwrap();
        assert!(matches!(s.next_question(&mut rng), Err(Error::SessionEnded(_))));
        assert!(matches!(s.end_session(&strong_stats()), Err(Error::SessionEnded(_))));
    }
}
