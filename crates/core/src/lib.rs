//! # mathtier Core
//!
//! Domain types, the tier/band difficulty model, store traits, and error
//! definitions for the mathtier practice orchestrator. This crate has no
//! framework dependencies; every other crate depends inward on it.
//!
//! ## Layout
//!
//! - `tier` / `progression`: the pure 100-tier / 5-band model, milestones,
//!   mastery-test gating, and the session-end advancement rule
//! - `learner` / `session`: the storage collaborators, as traits
//! - `answer`: tolerant numeric answer checking
//! - `event`: broadcast bus for practice events

pub mod answer;
pub mod content;
pub mod error;
pub mod event;
pub mod learner;
pub mod operation;
pub mod progression;
pub mod session;
pub mod tier;

// Re-export key types at crate root for ergonomics
pub use answer::{ParsedAnswer, check_answer};
pub use content::{ContentItem, FactKey, Variant};
pub use error::{Error, Result, StoreError};
pub use event::{EventBus, PracticeEvent};
pub use learner::{LearnerStore, TierUpdate};
pub use operation::{MathTiers, Operation};
pub use progression::{
    AdvancementInput, CappedAdvancement, MasteryTestRequirements, Milestone, MilestoneReward,
    TierProgression,
};
pub use session::{SessionRecord, SessionStore};
pub use tier::{Band, OperandRange};
