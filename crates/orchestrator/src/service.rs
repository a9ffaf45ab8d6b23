//! Session boundary — the operations callers invoke.
//!
//! Every call loads the session state from the [`SessionStore`], runs one
//! engine step, and writes it back. The learner store is touched twice per
//! session: a tier read at start and, only if the tier changed, a write at
//! the end. Concurrent sessions for one learner are independent; their tier
//! writes are last-write-wins.

use chrono::Utc;
use mathtier_agents::{CoachState, EchoOutcome, HintPayload};
use mathtier_config::PracticeConfig;
use mathtier_content::{build_item, generate_anonymous, parse_problem_text};
use mathtier_core::{
    ContentItem, Error, EventBus, LearnerStore, Operation, PracticeEvent, Result, SessionRecord,
    SessionStore, TierProgression, Variant,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::AggregateStats;
use crate::envelope::DirectiveEnvelope;
use crate::state::{OrchestratorState, SessionStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session_id: String,
    pub first_question: ContentItem,
    pub envelope: DirectiveEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub is_correct: bool,
    /// The item just answered, with its correct answer and explanation.
    pub answered: ContentItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<HintPayload>,
    pub echo: EchoOutcome,
    pub next_question: ContentItem,
    pub envelope: DirectiveEnvelope,
    pub session_stats: SessionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_queue_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_recovery: Option<bool>,
}

impl SessionStatus {
    fn missing() -> Self {
        Self {
            exists: false,
            question_number: None,
            tilt_score: None,
            echo_queue_size: None,
            is_in_recovery: None,
        }
    }
}

pub struct PracticeService {
    sessions: Arc<dyn SessionStore>,
    learners: Arc<dyn LearnerStore>,
    events: Arc<EventBus>,
    config: PracticeConfig,
}

impl PracticeService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        learners: Arc<dyn LearnerStore>,
        config: PracticeConfig,
    ) -> Self {
        Self {
            sessions,
            learners,
            events: Arc::new(EventBus::default()),
            config,
        }
    }

    /// Share an existing event bus instead of the service's own.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    /// Start a session for a known learner and serve the first question.
    pub async fn initialize_session(
        &self,
        user_id: Option<&str>,
        operation: Operation,
    ) -> Result<SessionStart> {
        let user_id = match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::Unauthorized),
        };
        let tiers = self
            .learners
            .get_math_tiers(user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))?;

        let session_id = format!("sess_{}", Uuid::new_v4().simple());
        let mut state = OrchestratorState::initialize(
            session_id.clone(),
            user_id,
            operation,
            &tiers,
            self.config.clone(),
        );
        let envelope = state.next_question(&mut rand::rng())?;
        self.save(&state).await?;

        let starting_tier = state.learner_model.current_tier;
        info!(session_id = %session_id, user_id, %operation, starting_tier, "Session started");
        self.events.publish(PracticeEvent::SessionStarted {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            operation,
            starting_tier,
            timestamp: Utc::now(),
        });
        self.publish_served(&state, &envelope);

        Ok(SessionStart {
            session_id,
            first_question: envelope.selection.item.clone(),
            envelope,
        })
    }

    /// Check the answer to the pending question and serve the next one.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        user_answer: &str,
        latency_ms: u64,
        help_used: bool,
    ) -> Result<SubmitResult> {
        let mut state = self.load(session_id).await?;
        let outcome = state.process_answer(user_answer, latency_ms, help_used)?;

        self.events.publish(PracticeEvent::AnswerProcessed {
            session_id: session_id.to_string(),
            question_number: state.question_number,
            is_correct: outcome.is_correct,
            latency_ms,
            timestamp: Utc::now(),
        });
        if let Some(coach_state) = outcome.coach_transition {
            self.events.publish(PracticeEvent::RecoveryChanged {
                session_id: session_id.to_string(),
                recovering: coach_state == CoachState::Recovering,
                tilt_score: state.coach.tilt_score(),
                timestamp: Utc::now(),
            });
        }
        if outcome.echo == EchoOutcome::Resolved {
            self.events.publish(PracticeEvent::EchoResolved {
                session_id: session_id.to_string(),
                fact: outcome.item.equation(),
                timestamp: Utc::now(),
            });
        }

        let envelope = state.next_question(&mut rand::rng())?;
        self.save(&state).await?;
        self.publish_served(&state, &envelope);

        Ok(SubmitResult {
            is_correct: outcome.is_correct,
            answered: outcome.item,
            hint: outcome.hint,
            echo: outcome.echo,
            next_question: envelope.selection.item.clone(),
            envelope,
            session_stats: state.stats,
        })
    }

    /// Next hint for the pending question.
    ///
    /// With no pending question, `problem_text` (e.g. `"42 ÷ 7"`) rebuilds
    /// the item; `correct_answer` overrides the computed answer when given.
    pub async fn request_hint(
        &self,
        session_id: &str,
        user_answer: &str,
        latency_ms: u64,
        problem_text: Option<&str>,
        correct_answer: Option<i64>,
    ) -> Result<Option<HintPayload>> {
        let mut state = self.load(session_id).await?;

        let hint = if state.current_item.is_some() {
            state.request_hint(user_answer, latency_ms)?
        } else {
            let (operation, a, b) = problem_text
                .and_then(parse_problem_text)
                .ok_or(Error::NoCurrentQuestion)?;
            let mut item = build_item(
                operation,
                a,
                b,
                state.placement.estimated_tier(),
                Variant::Standard,
                String::new(),
            );
            if let Some(answer) = correct_answer {
                item.correct_answer = answer;
            }
            debug!(session_id, item = %item.equation(), "Hint for rebuilt item");
            state.request_hint_for(&item, user_answer, latency_ms)?
        };

        self.save(&state).await?;
        Ok(hint)
    }

    /// Close the session, persist a changed tier, and drop the session.
    pub async fn end_session(
        &self,
        session_id: &str,
        stats: AggregateStats,
    ) -> Result<TierProgression> {
        let mut state = self.load(session_id).await?;
        let outcome = state.end_session(&stats)?;
        let progression = outcome.progression;

        if let Some(update) = outcome.update {
            self.learners
                .record_tier_progress(&state.user_id, update)
                .await?;
            info!(
                user_id = %state.user_id,
                operation = %state.operation,
                previous_tier = progression.previous_tier,
                new_tier = progression.new_tier,
                "Tier advanced"
            );
            self.events.publish(PracticeEvent::TierAdvanced {
                user_id: state.user_id.clone(),
                operation: state.operation,
                previous_tier: progression.previous_tier,
                new_tier: progression.new_tier,
                blocked_by_band_boundary: progression.blocked_by_band_boundary,
                timestamp: Utc::now(),
            });
            if let Some(milestone) = &progression.milestone {
                self.events.publish(PracticeEvent::MilestoneReached {
                    user_id: state.user_id.clone(),
                    tier: milestone.tier,
                    coins: milestone.reward.coins,
                    xp: milestone.reward.xp,
                    timestamp: Utc::now(),
                });
            }
        }

        self.sessions.delete(session_id).await?;
        Ok(progression)
    }

    /// Stats the session itself has accumulated, for callers that do not
    /// keep their own.
    pub async fn aggregate_stats(&self, session_id: &str) -> Result<AggregateStats> {
        Ok(self.load(session_id).await?.aggregate_stats())
    }

    pub async fn get_session_status(&self, session_id: &str) -> Result<SessionStatus> {
        let Some(record) = self.sessions.get(session_id).await? else {
            return Ok(SessionStatus::missing());
        };
        let state = decode(record)?;
        Ok(SessionStatus {
            exists: true,
            question_number: Some(state.question_number),
            tilt_score: Some(state.coach.tilt_score()),
            echo_queue_size: Some(state.echo.len()),
            is_in_recovery: Some(state.coach.is_in_recovery()),
        })
    }

    /// Tier-1 practice item with no session behind it.
    pub fn anonymous_question(&self, operation: Operation) -> ContentItem {
        generate_anonymous(operation, &mut rand::rng())
    }

    async fn load(&self, session_id: &str) -> Result<OrchestratorState> {
        let record = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        decode(record)
    }

    async fn save(&self, state: &OrchestratorState) -> Result<()> {
        let record = SessionRecord {
            session_id: state.session_id.clone(),
            user_id: state.user_id.clone(),
            operation: state.operation,
            state: serde_json::to_value(state)?,
            updated_at: Utc::now(),
        };
        self.sessions.put(record).await?;
        Ok(())
    }

    fn publish_served(&self, state: &OrchestratorState, envelope: &DirectiveEnvelope) {
        self.events.publish(PracticeEvent::QuestionServed {
            session_id: state.session_id.clone(),
            question_number: state.question_number,
            tier: envelope.selection.item.tier_generated,
            from_echo: envelope.is_echo(),
            timestamp: Utc::now(),
        });
    }
}

fn decode(record: SessionRecord) -> Result<OrchestratorState> {
    let session_id = record.session_id;
    let state: OrchestratorState = serde_json::from_value(record.state).map_err(|e| {
        warn!(session_id = %session_id, error = %e, "Corrupt session state");
        Error::CorruptSession {
            session_id: session_id.clone(),
            reason: e.to_string(),
        }
    })?;
    if state.session_id != session_id {
        return Err(Error::CorruptSession {
            reason: format!("state belongs to session {}", state.session_id),
            session_id,
        });
    }
    Ok(state)
}
