//! The three cooperating agents behind each practice session.
//!
//! 1. **Placement** — rolling-window tier estimate and confidence
//! 2. **Coach** — tilt tracking with hysteresis, hint ladder
//! 3. **Echo** — spaced re-practice of missed facts
//!
//! Agents are plain serializable state plus synchronous transforms. They
//! take their tuning by reference on every call so the session state does
//! not duplicate configuration.

pub mod coach;
pub mod echo;
pub mod hints;
pub mod placement;

pub use coach::{CoachAgent, CoachDirective, CoachState, HintFrequency};
pub use echo::{EchoAgent, EchoDirective, EchoOutcome, EchoQueueEntry, EchoStatus};
pub use hints::{HintPayload, get_hint};
pub use placement::{AnswerSample, PlacementAgent, PlacementDirective};
