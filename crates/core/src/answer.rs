//! Answer checking.
//!
//! Learner input arrives as text. Anything that is not a finite number is
//! `Malformed` and simply counts as incorrect; it is never an error.

use serde::{Deserialize, Serialize};

use crate::content::ContentItem;

/// Absolute tolerance absorbing string/float round-trip noise.
pub const ANSWER_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParsedAnswer {
    Numeric(f64),
    Malformed,
}

impl ParsedAnswer {
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Numeric(v),
            _ => Self::Malformed,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Malformed => None,
        }
    }
}

/// True when `raw` is within [`ANSWER_TOLERANCE`] of the item's answer.
pub fn check_answer(item: &ContentItem, raw: &str) -> bool {
    ParsedAnswer::parse(raw)
        .value()
        .is_some_and(|v| (v - item.correct_answer as f64).abs() < ANSWER_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Variant;
    use crate::operation::Operation;

    fn seven() -> ContentItem {
        ContentItem {
            id: "q".into(),
            operation: Operation::Addition,
            operand1: 3,
            operand2: 4,
            prompt_text: "3 + 4 = ?".into(),
            correct_answer: 7,
            variant: Variant::Standard,
            tier_generated: 1,
            explanation: "3 + 4 = 7".into(),
        }
    }

    #[test]
    fn tolerant_numeric_matching() {
        let item = seven();
        assert!(check_answer(&item, "7"));
        assert!(check_answer(&item, " 7 "));
        assert!(check_answer(&item, "7.0"));
        assert!(check_answer(&item, "7.004"));
        assert!(!check_answer(&item, "7.5"));
        assert!(!check_answer(&item, "8"));
    }

    #[test]
    fn malformed_is_incorrect_not_error() {
        let item = seven();
        assert!(!check_answer(&item, "seven"));
        assert!(!check_answer(&item, ""));
        assert!(!check_answer(&item, "NaN"));
        assert_eq!(ParsedAnswer::parse("inf"), ParsedAnswer::Malformed);
    }

    #[test]
    fn thousands_separators_accepted() {
        assert_eq!(ParsedAnswer::parse("1,250"), ParsedAnswer::Numeric(1250.0));
    }
}
