//! The four arithmetic operations and the learner's per-operation tiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tier::{MAX_TIER, MIN_TIER, clamp_tier};

/// One of the four practiced arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    /// The symbol shown in prompts.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "−",
            Self::Multiplication => "×",
            Self::Division => "÷",
        }
    }

    /// Parse an operator symbol, accepting ASCII fallbacks.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "+" => Some(Self::Addition),
            "-" | "−" => Some(Self::Subtraction),
            "*" | "x" | "×" => Some(Self::Multiplication),
            "/" | "÷" => Some(Self::Division),
            _ => None,
        }
    }

    /// Apply the operation. Division is integral by construction of the
    /// content generator; a zero divisor yields 0. Results saturate at the
    /// `i64` bounds instead of overflowing.
    pub fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Self::Addition => a.saturating_add(b),
            Self::Subtraction => a.saturating_sub(b),
            Self::Multiplication => a.saturating_mul(b),
            Self::Division => a.checked_div(b).unwrap_or(0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "addition" | "add" => Ok(Self::Addition),
            "subtraction" | "sub" => Ok(Self::Subtraction),
            "multiplication" | "mul" => Ok(Self::Multiplication),
            "division" | "div" => Ok(Self::Division),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// A learner's persisted tier for each operation.
///
/// Deserialization is lenient: a missing, non-numeric, or out-of-range
/// value becomes a clamped tier (default 1) instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathTiers {
    #[serde(default = "default_tier", deserialize_with = "lenient_tier")]
    pub addition: u8,
    #[serde(default = "default_tier", deserialize_with = "lenient_tier")]
    pub subtraction: u8,
    #[serde(default = "default_tier", deserialize_with = "lenient_tier")]
    pub multiplication: u8,
    #[serde(default = "default_tier", deserialize_with = "lenient_tier")]
    pub division: u8,
}

fn default_tier() -> u8 {
    MIN_TIER
}

fn lenient_tier<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let tier = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(clamp_tier),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(clamp_tier),
        _ => None,
    };
    Ok(tier.unwrap_or(MIN_TIER))
}

impl Default for MathTiers {
    fn default() -> Self {
        Self {
            addition: MIN_TIER,
            subtraction: MIN_TIER,
            multiplication: MIN_TIER,
            division: MIN_TIER,
        }
    }
}

impl MathTiers {
    pub fn get(&self, operation: Operation) -> u8 {
        match operation {
            Operation::Addition => self.addition,
            Operation::Subtraction => self.subtraction,
            Operation::Multiplication => self.multiplication,
            Operation::Division => self.division,
        }
    }

    pub fn set(&mut self, operation: Operation, tier: u8) {
        let tier = tier.clamp(MIN_TIER, MAX_TIER);
        match operation {
            Operation::Addition => self.addition = tier,
            Operation::Subtraction => self.subtraction = tier,
            Operation::Multiplication => self.multiplication = tier,
            Operation::Division => self.division = tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_parse_back() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operation::from_symbol("*"), Some(Operation::Multiplication));
        assert_eq!(Operation::from_symbol("?"), None);
    }

    #[test]
    fn apply_saturates_instead_of_overflowing() {
        assert_eq!(Operation::Addition.apply(i64::MAX, 1), i64::MAX);
        assert_eq!(Operation::Subtraction.apply(i64::MIN, 1), i64::MIN);
        assert_eq!(Operation::Multiplication.apply(i64::MAX, 2), i64::MAX);
        assert_eq!(Operation::Division.apply(i64::MIN, -1), 0);
        assert_eq!(Operation::Division.apply(42, 0), 0);
        assert_eq!(Operation::Division.apply(42, 7), 6);
    }

    #[test]
    fn operation_from_str() {
        assert_eq!("Division".parse::<Operation>().unwrap(), Operation::Division);
        assert!("modulo".parse::<Operation>().is_err());
    }

    #[test]
    fn math_tiers_lenient_deserialization() {
        let json =
            r#"{"addition": 42, "subtraction": "17", "multiplication": "abc", "division": 250}"#;
        let tiers: MathTiers = serde_json::from_str(json).unwrap();
        assert_eq!(tiers.addition, 42);
        assert_eq!(tiers.subtraction, 17);
        assert_eq!(tiers.multiplication, 1);
        assert_eq!(tiers.division, 100);
    }

    #[test]
    fn math_tiers_missing_fields_default_to_one() {
        let tiers: MathTiers = serde_json::from_str("{}").unwrap();
        assert_eq!(tiers, MathTiers::default());
    }

    #[test]
    fn set_clamps() {
        let mut tiers = MathTiers::default();
        tiers.set(Operation::Addition, 0);
        assert_eq!(tiers.addition, 1);
        tiers.set(Operation::Division, 200);
        assert_eq!(tiers.division, 100);
    }
}
