//! Learner store trait — the persistence collaborator.
//!
//! The orchestrator never designs storage; it only reads a learner's
//! per-operation tiers when a session starts and writes a tier update
//! when a session ends with a changed tier.
//!
//! Implementations: in-memory (for testing), JSON file (CLI).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::operation::{MathTiers, Operation};
use crate::progression::Milestone;

/// A tier change to persist for one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierUpdate {
    pub operation: Operation,
    pub new_tier: u8,
    /// Milestone whose coins/xp should be credited, at most once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
}

/// The core LearnerStore trait.
#[async_trait]
pub trait LearnerStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Per-operation tiers for a learner, or `None` if the learner is unknown.
    async fn get_math_tiers(&self, user_id: &str) -> Result<Option<MathTiers>, StoreError>;

    /// Set the operation's tier, reset the skill-progress counter, and credit
    /// the milestone reward if present.
    async fn record_tier_progress(
        &self,
        user_id: &str,
        update: TierUpdate,
    ) -> Result<(), StoreError>;
}
