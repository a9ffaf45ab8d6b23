//! Store implementations for mathtier.
//!
//! - [`InMemorySessionStore`]: live sessions with lazy TTL eviction
//! - [`InMemoryLearnerStore`]: ephemeral learner profiles (tests, demos)
//! - [`FileLearnerStore`]: learner profiles persisted as one JSON file

pub mod file_backend;
pub mod in_memory;
pub mod profile;

pub use file_backend::FileLearnerStore;
pub use in_memory::{InMemoryLearnerStore, InMemorySessionStore};
pub use profile::{CreditedMilestone, LearnerProfile};
