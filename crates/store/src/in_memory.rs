//! In-memory stores — useful for testing and single-process hosts.

use async_trait::async_trait;
use mathtier_core::error::StoreError;
use mathtier_core::learner::{LearnerStore, TierUpdate};
use mathtier_core::session::{SessionRecord, SessionStore};
use mathtier_core::MathTiers;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::profile::LearnerProfile;

/// Live sessions keyed by id.
///
/// A session not touched for `ttl` is gone: expired entries are dropped
/// lazily whenever the map is accessed, so there is no background task.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, (SessionRecord, Instant)>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, (SessionRecord, Instant)>) {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, (_, touched)| now.duration_since(*touched) < self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired sessions");
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        sessions.insert(record.session_id.clone(), (record, Instant::now()));
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        Ok(sessions.get(session_id).map(|(record, _)| record.clone()))
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        Ok(sessions.len())
    }
}

/// Learner profiles held in a map. Nothing survives the process.
pub struct InMemoryLearnerStore {
    profiles: Arc<RwLock<HashMap<String, LearnerProfile>>>,
}

impl InMemoryLearnerStore {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register (or replace) a learner with the given tiers.
    pub async fn insert(&self, user_id: &str, tiers: MathTiers) {
        let profile = LearnerProfile::new(user_id).with_tiers(tiers);
        self.profiles.write().await.insert(user_id.to_string(), profile);
    }

    pub async fn profile(&self, user_id: &str) -> Option<LearnerProfile> {
        self.profiles.read().await.get(user_id).cloned()
    }
}

impl Default for InMemoryLearnerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LearnerStore for InMemoryLearnerStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_math_tiers(&self, user_id: &str) -> Result<Option<MathTiers>, StoreError> {
        Ok(self.profiles.read().await.get(user_id).map(|p| p.math_tiers))
    }

    async fn record_tier_progress(
        &self,
        user_id: &str,
        update: TierUpdate,
    ) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        let credited = profile.apply(&update);
        debug!(
            user_id,
            operation = %update.operation,
            new_tier = update.new_tier,
            credited,
            "Tier recorded"
        );
        Ok(())
    }
}
