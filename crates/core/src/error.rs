//! Error types for the mathtier domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Session-boundary failures are surfaced as discriminated variants so a
//! caller can degrade gracefully (e.g. restart a session). Nothing here is
//! fatal to the host process.

use thiserror::Error;

/// The top-level error type for all mathtier operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Session boundary errors ---
    #[error("Unauthorized: no active learner identity")]
    Unauthorized,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No current question: answer or hint requested before a question was issued")]
    NoCurrentQuestion,

    #[error("Session already ended: {0}")]
    SessionEnded(String),

    #[error("Corrupt session state for {session_id}: {reason}")]
    CorruptSession { session_id: String, reason: String },

    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for the error, for callers that map
    /// errors onto their own response shapes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::UserNotFound(_) => "user_not_found",
            Self::SessionNotFound(_) => "session_not_found",
            Self::NoCurrentQuestion => "no_current_question",
            Self::SessionEnded(_) => "session_ended",
            Self::CorruptSession { .. } => "corrupt_session",
            Self::Store(_) => "store_error",
            Self::Config { .. } => "config_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Failed to (de)serialize record: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_displays_correctly() {
        let err = Error::SessionNotFound("sess_42".into());
        assert!(err.to_string().contains("sess_42"));
        assert_eq!(err.code(), "session_not_found");
    }

    #[test]
    fn store_error_converts() {
        let err: Error = StoreError::Storage("disk full".into()).into();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(err.code(), "store_error");
    }
}
