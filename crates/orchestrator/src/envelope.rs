//! The directive envelope: what gets served next and why.
//!
//! Built fresh on every `next_question` and never persisted.

use mathtier_agents::{CoachDirective, EchoDirective, PlacementDirective};
use mathtier_core::ContentItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Fresh,
    Echo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub item: ContentItem,
    pub source: SelectionSource,
}

/// Placement directive plus the tier actually targeted after the coach
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementView {
    pub target_difficulty: f64,
    pub estimated_tier: u8,
    pub confidence: f64,
    pub target_tier: u8,
}

impl PlacementView {
    pub fn new(directive: PlacementDirective, target_tier: u8) -> Self {
        Self {
            target_difficulty: directive.target_difficulty,
            estimated_tier: directive.estimated_tier,
            confidence: directive.confidence,
            target_tier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directives {
    pub placement: PlacementView,
    pub coach: CoachDirective,
    pub echo: EchoDirective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveEnvelope {
    pub selection: Selection,
    pub directives: Directives,
}

impl DirectiveEnvelope {
    pub fn item(&self) -> &ContentItem {
        &self.selection.item
    }

    pub fn is_echo(&self) -> bool {
        self.selection.source == SelectionSource::Echo
    }
}
