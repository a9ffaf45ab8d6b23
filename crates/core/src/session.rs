//! Session store trait — an opaque key-value home for live sessions.
//!
//! The orchestrator is agnostic to whether the store is in-process,
//! distributed, or durable. State travels as JSON so any backend can hold
//! it; the orchestrator validates the payload when it loads a record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::operation::Operation;

/// A stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub operation: Operation,
    /// Serialized orchestrator state.
    pub state: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// The core SessionStore trait.
///
/// Implementations own eviction of abandoned sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Insert or replace a session.
    async fn put(&self, record: SessionRecord) -> Result<(), StoreError>;

    /// Fetch a live session.
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Remove a session. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize, StoreError>;
}
