pub mod onboard;
pub mod practice;
pub mod status;
pub mod tiers;

use mathtier_config::AppConfig;
use mathtier_store::FileLearnerStore;

/// The learner file under the configured data directory.
pub fn open_learners(config: &AppConfig) -> FileLearnerStore {
    FileLearnerStore::in_dir(&config.data_dir())
}

pub fn require_user(user: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match user {
        Some(u) if !u.trim().is_empty() => Ok(u.trim().to_string()),
        _ => Err("No learner given. Pass --user or set MATHTIER_USER.".into()),
    }
}
