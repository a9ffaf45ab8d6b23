//! File-based learner store — one JSON document of learner profiles.
//!
//! Storage location: `<data_dir>/learners.json`, a map from user id to
//! [`LearnerProfile`]. Profiles are loaded into memory on creation and the
//! whole file is rewritten on every mutation. Small, human-inspectable,
//! and good enough for a single-learner CLI.

use async_trait::async_trait;
use mathtier_core::error::StoreError;
use mathtier_core::learner::{LearnerStore, TierUpdate};
use mathtier_core::MathTiers;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::profile::LearnerProfile;

pub const LEARNERS_FILE: &str = "learners.json";

pub struct FileLearnerStore {
    path: PathBuf,
    profiles: Arc<RwLock<HashMap<String, LearnerProfile>>>,
}

impl FileLearnerStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty (created on first write). An unreadable
    /// or corrupt file is logged and also starts empty.
    pub fn new(path: PathBuf) -> Self {
        let profiles = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = profiles.len(), "File learner store loaded");
        Self {
            path,
            profiles: Arc::new(RwLock::new(profiles)),
        }
    }

    /// Open `<data_dir>/learners.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(LEARNERS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> HashMap<String, LearnerProfile> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        if content.trim().is_empty() {
            return HashMap::new();
        }
        match serde_json::from_str(&content) {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt learner file");
                HashMap::new()
            }
        }
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let profiles = self.profiles.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Storage(format!("Failed to create data directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(&*profiles)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| StoreError::Storage(format!("Failed to write learner file: {e}")))?;
        Ok(())
    }

    /// Create the learner if missing. Returns whether a profile was created.
    pub async fn ensure_learner(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(user_id) {
            return Ok(false);
        }
        profiles.insert(user_id.to_string(), LearnerProfile::new(user_id));
        drop(profiles);
        self.flush().await?;
        info!(user_id, "Learner created");
        Ok(true)
    }

    pub async fn profile(&self, user_id: &str) -> Option<LearnerProfile> {
        self.profiles.read().await.get(user_id).cloned()
    }

    pub async fn profiles(&self) -> Vec<LearnerProfile> {
        let mut all: Vec<_> = self.profiles.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        all
    }
}

#[async_trait]
impl LearnerStore for FileLearnerStore {
    fn name(&self) -> &str {
        "file"
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
        drop(profiles);
        self.flush().await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use mathtier_core::Operation;
    use mathtier_core::progression::milestone_for_tier;

    #[tokio::test]
    async fn tiers_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLearnerStore::in_dir(dir.path());
        assert!(store.ensure_learner("ada").await.unwrap());
        assert!(!store.ensure_learner("ada").await.unwrap());

        store
            .record_tier_progress(
                "ada",
                TierUpdate {
                    operation: Operation::Multiplication,
                    new_tier: 40,
                    milestone: milestone_for_tier(40),
                },
            )
            .await
            .unwrap();

        let reopened = FileLearnerStore::in_dir(dir.path());
        let tiers = reopened.get_math_tiers("ada").await.unwrap().unwrap();
        assert_eq!(tiers.multiplication, 40);
        assert_eq!(tiers.addition, 1);
        let profile = reopened.profile("ada").await.unwrap();
        assert_eq!(profile.coins, 2000);
        assert_eq!(profile.credited_milestones.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLearnerStore::new(dir.path().join("nested").join(LEARNERS_FILE));
        assert!(store.get_math_tiers("ada").await.unwrap().is_none());
        store.ensure_learner("ada").await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEARNERS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        let store = FileLearnerStore::new(path);
        assert!(store.profiles().await.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_tiers_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEARNERS_FILE);
        std::fs::write(
            &path,
            r#"{"ada": {
                "user_id": "ada",
                "math_tiers": {"addition": 250, "subtraction": "x"},
                "updated_at": "2026-03-01T10:00:00Z"
            }}"#,
        )
        .unwrap();
        let store = FileLearnerStore::new(path);
        let tiers = store.get_math_tiers("ada").await.unwrap().unwrap();
        assert_eq!(tiers.addition, 100);
        assert_eq!(tiers.subtraction, 1);
    }
}
