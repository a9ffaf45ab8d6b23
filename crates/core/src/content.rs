//! Content items — concrete arithmetic problems presented to a learner.

use serde::{Deserialize, Serialize};

use crate::operation::Operation;

/// How a problem is worded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// `12 + 7 = ?`
    Standard,
    /// A one-sentence word problem.
    Word,
}

/// A generated problem. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub operation: Operation,
    /// For division this is the dividend.
    pub operand1: i64,
    /// For division this is the divisor.
    pub operand2: i64,
    pub prompt_text: String,
    pub correct_answer: i64,
    pub variant: Variant,
    pub tier_generated: u8,
    pub explanation: String,
}

impl ContentItem {
    /// The underlying fact, independent of wording.
    pub fn fact(&self) -> FactKey {
        FactKey {
            operation: self.operation,
            operand1: self.operand1,
            operand2: self.operand2,
        }
    }

    /// The bare equation, e.g. `42 ÷ 7`.
    pub fn equation(&self) -> String {
        format!("{} {} {}", self.operand1, self.operation.symbol(), self.operand2)
    }
}

/// Identity of an arithmetic fact: operation plus operand pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub operation: Operation,
    pub operand1: i64,
    pub operand2: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_ignores_wording() {
        let item = ContentItem {
            id: "a".into(),
            operation: Operation::Division,
            operand1: 42,
            operand2: 7,
            prompt_text: "42 ÷ 7 = ?".into(),
            correct_answer: 6,
            variant: Variant::Standard,
            tier_generated: 12,
            explanation: "42 ÷ 7 = 6 because 7 × 6 = 42.".into(),
        };
        let reworded = ContentItem {
            id: "b".into(),
            prompt_text: "Share 42 apples among 7 baskets.".into(),
            variant: Variant::Word,
            ..item.clone()
        };
        assert_eq!(item.fact(), reworded.fact());
        assert_eq!(item.equation(), "42 ÷ 7");
    }
}
