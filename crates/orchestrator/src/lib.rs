//! # mathtier Orchestrator
//!
//! Coordinates the placement, coach, and echo agents for one practice
//! session and exposes the session boundary callers talk to.
//!
//! Per turn:
//!
//! ```text
//! next_question ─▶ echo due? ──yes──▶ replay missed item
//!                      │
//!                      no ─▶ placement target + coach offset ─▶ generator
//!
//! process_answer ─▶ placement ─▶ coach (tilt, hint) ─▶ echo (enqueue / progress)
//!
//! end_session ─▶ advancement rule ─▶ band cap ─▶ learner store
//! ```
//!
//! [`OrchestratorState`] is the single-writer session state. It serializes
//! to JSON and lives in a [`SessionStore`](mathtier_core::SessionStore)
//! between turns; [`PracticeService`] does the loading and saving.

pub mod engine;
pub mod envelope;
pub mod service;
pub mod state;

pub use engine::{AggregateStats, AnswerOutcome, SessionOutcome};
pub use envelope::{DirectiveEnvelope, Directives, PlacementView, Selection, SelectionSource};
pub use service::{PracticeService, SessionStart, SessionStatus, SubmitResult};
pub use state::{LearnerModel, OrchestratorState, SessionPhase, SessionStats};
