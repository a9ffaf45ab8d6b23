//! The 100-tier / 5-band difficulty model.
//!
//! Pure, stateless functions. Every input is clamped rather than rejected:
//! a tier below 1 behaves like tier 1, a tier above 100 like tier 100.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::operation::Operation;

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 100;
pub const TIERS_PER_BAND: u8 = 20;

pub const MIN_DIFFICULTY: f64 = 0.05;
pub const MAX_DIFFICULTY: f64 = 0.95;

/// Clamp an arbitrary integer onto the tier axis.
pub fn clamp_tier(tier: i64) -> u8 {
    tier.clamp(MIN_TIER as i64, MAX_TIER as i64) as u8
}

// ── Bands ─────────────────────────────────────────────────────────────────

/// One of the five fixed 20-tier ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Foundation,
    Intermediate,
    Advanced,
    Expert,
    Master,
}

impl Band {
    pub const ALL: [Band; 5] = [
        Band::Foundation,
        Band::Intermediate,
        Band::Advanced,
        Band::Expert,
        Band::Master,
    ];

    /// 1-based position of the band on the tier axis.
    pub fn number(&self) -> u8 {
        match self {
            Self::Foundation => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Expert => 4,
            Self::Master => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Foundation => "Foundation",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
            Self::Master => "Master",
        }
    }

    /// Display color affordance (hex).
    pub fn color(&self) -> &'static str {
        match self {
            Self::Foundation => "#4CAF50",
            Self::Intermediate => "#2196F3",
            Self::Advanced => "#9C27B0",
            Self::Expert => "#FF9800",
            Self::Master => "#F44336",
        }
    }

    pub fn min_tier(&self) -> u8 {
        (self.number() - 1) * TIERS_PER_BAND + 1
    }

    /// The band's upper bound, which is also its boundary tier.
    pub fn max_tier(&self) -> u8 {
        self.number() * TIERS_PER_BAND
    }

    pub fn contains(&self, tier: u8) -> bool {
        (self.min_tier()..=self.max_tier()).contains(&tier)
    }

    pub fn next(&self) -> Option<Band> {
        match self {
            Self::Foundation => Some(Self::Intermediate),
            Self::Intermediate => Some(Self::Advanced),
            Self::Advanced => Some(Self::Expert),
            Self::Expert => Some(Self::Master),
            Self::Master => None,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The band owning `tier`, after clamping.
pub fn get_band_for_tier(tier: i64) -> Band {
    let tier = clamp_tier(tier);
    let index = (tier - 1) / TIERS_PER_BAND;
    Band::ALL[index as usize]
}

/// True when `tier` is exactly a band's upper bound (20, 40, 60, 80, 100).
pub fn is_at_band_boundary(tier: i64) -> bool {
    (MIN_TIER as i64..=MAX_TIER as i64).contains(&tier) && tier % TIERS_PER_BAND as i64 == 0
}

/// True when `from` and `to` fall in different bands.
pub fn crosses_band_boundary(from: i64, to: i64) -> bool {
    get_band_for_tier(from) != get_band_for_tier(to)
}

// ── Difficulty ────────────────────────────────────────────────────────────

/// Affine map from tier [1,100] onto difficulty [0.05,0.95].
pub fn tier_to_difficulty(tier: i64) -> f64 {
    let t = clamp_tier(tier) as f64;
    let span = (MAX_TIER - MIN_TIER) as f64;
    MIN_DIFFICULTY + (t - MIN_TIER as f64) / span * (MAX_DIFFICULTY - MIN_DIFFICULTY)
}

/// Inverse of [`tier_to_difficulty`], rounding to the nearest tier.
/// Non-finite input maps to tier 1.
pub fn difficulty_to_tier(difficulty: f64) -> u8 {
    if !difficulty.is_finite() {
        return MIN_TIER;
    }
    let d = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let span = (MAX_TIER - MIN_TIER) as f64;
    let t = MIN_TIER as f64 + (d - MIN_DIFFICULTY) / (MAX_DIFFICULTY - MIN_DIFFICULTY) * span;
    clamp_tier(t.round() as i64)
}

// ── Operand ranges ────────────────────────────────────────────────────────

/// Inclusive operand bounds for a tier and operation.
///
/// For division the range bounds the divisor and the quotient; the dividend
/// is their product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandRange {
    pub min: i64,
    pub max: i64,
}

impl OperandRange {
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub fn get_tier_operand_range(tier: i64, operation: Operation) -> OperandRange {
    let t = clamp_tier(tier) as i64 - 1;
    match operation {
        Operation::Addition | Operation::Subtraction => OperandRange {
            min: 1 + t / 5,
            max: 10 + t * 10,
        },
        Operation::Multiplication => OperandRange {
            min: 1 + t / 10,
            max: 5 + t / 2,
        },
        Operation::Division => OperandRange {
            min: 1 + t / 12,
            max: 5 + t / 3,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_has_exactly_one_band() {
        for t in 1..=100i64 {
            let owners = Band::ALL.iter().filter(|b| b.contains(t as u8)).count();
            assert_eq!(owners, 1, "tier {t}");
            assert!(get_band_for_tier(t).contains(t as u8));
        }
    }

    #[test]
    fn band_lookup_clamps() {
        assert_eq!(get_band_for_tier(0), Band::Foundation);
        assert_eq!(get_band_for_tier(-7), Band::Foundation);
        assert_eq!(get_band_for_tier(101), Band::Master);
        assert_eq!(get_band_for_tier(20), Band::Foundation);
        assert_eq!(get_band_for_tier(21), Band::Intermediate);
        assert_eq!(get_band_for_tier(60), Band::Advanced);
    }

    #[test]
    fn difficulty_round_trip_within_one() {
        for t in 1..=100i64 {
            let back = difficulty_to_tier(tier_to_difficulty(t)) as i64;
            assert!((back - t).abs() <= 1, "tier {t} came back as {back}");
        }
    }

    #[test]
    fn difficulty_endpoints_and_clamping() {
        assert!((tier_to_difficulty(1) - 0.05).abs() < 1e-9);
        assert!((tier_to_difficulty(100) - 0.95).abs() < 1e-9);
        assert!((tier_to_difficulty(-3) - 0.05).abs() < 1e-9);
        assert_eq!(difficulty_to_tier(2.0), 100);
        assert_eq!(difficulty_to_tier(-1.0), 1);
        assert_eq!(difficulty_to_tier(f64::NAN), 1);
    }

    #[test]
    fn operand_ranges_are_monotone() {
        for op in Operation::ALL {
            let mut prev = get_tier_operand_range(1, op);
            for t in 2..=100 {
                let r = get_tier_operand_range(t, op);
                assert!(r.min >= prev.min && r.max >= prev.max, "{op} tier {t}");
                assert!(r.min <= r.max);
                prev = r;
            }
        }
    }

    #[test]
    fn division_ranges_are_narrowest() {
        for t in 1..=100 {
            let div = get_tier_operand_range(t, Operation::Division);
            for op in [Operation::Addition, Operation::Subtraction, Operation::Multiplication] {
                let other = get_tier_operand_range(t, op);
                assert!(div.min <= other.min, "tier {t} vs {op}");
                assert!(div.max <= other.max, "tier {t} vs {op}");
            }
        }
    }

    #[test]
    fn boundaries() {
        let boundaries: Vec<i64> = (1..=100).filter(|t| is_at_band_boundary(*t)).collect();
        assert_eq!(boundaries, vec![20, 40, 60, 80, 100]);
        assert!(crosses_band_boundary(59, 62));
        assert!(!crosses_band_boundary(41, 60));
    }
}
