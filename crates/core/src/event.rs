//! Practice event system — decoupled notifications out of live sessions.
//!
//! Events are published when something interesting happens in a session.
//! Observers (CLI progress display, analytics sinks) subscribe without the
//! orchestrator knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::operation::Operation;

/// All practice events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PracticeEvent {
    /// A new practice session started
    SessionStarted {
        session_id: String,
        user_id: String,
        operation: Operation,
        starting_tier: u8,
        timestamp: DateTime<Utc>,
    },

    /// A question was served to the learner
    QuestionServed {
        session_id: String,
        question_number: u32,
        tier: u8,
        from_echo: bool,
        timestamp: DateTime<Utc>,
    },

    /// An answer was checked
    AnswerProcessed {
        session_id: String,
        question_number: u32,
        is_correct: bool,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The coach moved into or out of recovery
    RecoveryChanged {
        session_id: String,
        recovering: bool,
        tilt_score: f64,
        timestamp: DateTime<Utc>,
    },

    /// A missed fact was answered correctly enough times to retire it
    EchoResolved {
        session_id: String,
        fact: String,
        timestamp: DateTime<Utc>,
    },

    /// A session ended with a tier change
    TierAdvanced {
        user_id: String,
        operation: Operation,
        previous_tier: u8,
        new_tier: u8,
        blocked_by_band_boundary: bool,
        timestamp: DateTime<Utc>,
    },

    /// A milestone reward was earned
    MilestoneReached {
        user_id: String,
        tier: u8,
        coins: u32,
        xp: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for practice events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<PracticeEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: PracticeEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PracticeEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(PracticeEvent::AnswerProcessed {
            session_id: "sess_1".into(),
            question_number: 4,
            is_correct: true,
            latency_ms: 1800,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            PracticeEvent::AnswerProcessed { question_number, is_correct, .. } => {
                assert_eq!(*question_number, 4);
                assert!(is_correct);
            }
            _ => panic!("Expected AnswerProcessed event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(PracticeEvent::MilestoneReached {
            user_id: "learner".into(),
            tier: 20,
            coins: 1000,
            xp: 2000,
            timestamp: Utc::now(),
        });
    }
}
