//! Operand drawing and item construction.

use mathtier_config::ContentConfig;
use mathtier_core::tier::{MIN_TIER, clamp_tier, get_tier_operand_range};
use mathtier_core::{ContentItem, Operation, Variant};
use rand::Rng;
use tracing::trace;
use uuid::Uuid;

use crate::explanation::explain;

const NAMES: [&str; 8] = ["Ava", "Noah", "Mia", "Leo", "Zoe", "Sam", "Ivy", "Omar"];

/// Draw an operand pair for `operation` at `tier`.
///
/// - Addition / multiplication: both drawn independently in range.
/// - Subtraction: ordered so the result is never negative.
/// - Division: built as `divisor × quotient`, so `a % b == 0` always holds
///   and `b` is never zero.
pub fn generate_operands<R: Rng + ?Sized>(
    operation: Operation,
    tier: u8,
    rng: &mut R,
) -> (i64, i64) {
    let range = get_tier_operand_range(tier as i64, operation);
    let mut draw = || rng.random_range(range.min..=range.max);

    match operation {
        Operation::Addition | Operation::Multiplication => (draw(), draw()),
        Operation::Subtraction => {
            let (a, b) = (draw(), draw());
            if a >= b { (a, b) } else { (b, a) }
        }
        Operation::Division => {
            let divisor = draw().max(1);
            let quotient = draw();
            (divisor * quotient, divisor)
        }
    }
}

/// Generate a fresh item at `tier`.
pub fn generate_item<R: Rng + ?Sized>(
    operation: Operation,
    tier: u8,
    config: &ContentConfig,
    rng: &mut R,
) -> ContentItem {
    let tier = clamp_tier(tier as i64);
    let (a, b) = generate_operands(operation, tier, rng);
    let variant = if rng.random_bool(config.word_problem_rate.clamp(0.0, 1.0)) {
        Variant::Word
    } else {
        Variant::Standard
    };
    let prompt = match variant {
        Variant::Standard => standard_prompt(operation, a, b),
        Variant::Word => {
            let name = NAMES[rng.random_range(0..NAMES.len())];
            word_prompt(operation, a, b, name)
        }
    };
    trace!(%operation, tier, a, b, ?variant, "Generated item");
    build_item(operation, a, b, tier, variant, prompt)
}

/// Tier-1 standard item for anonymous practice.
pub fn generate_anonymous<R: Rng + ?Sized>(operation: Operation, rng: &mut R) -> ContentItem {
    let (a, b) = generate_operands(operation, MIN_TIER, rng);
    build_item(operation, a, b, MIN_TIER, Variant::Standard, standard_prompt(operation, a, b))
}

/// Assemble an item from known operands. Pass an empty prompt to get the
/// standard wording.
pub fn build_item(
    operation: Operation,
    a: i64,
    b: i64,
    tier: u8,
    variant: Variant,
    prompt: String,
) -> ContentItem {
    let answer = operation.apply(a, b);
    let prompt_text = if prompt.trim().is_empty() {
        standard_prompt(operation, a, b)
    } else {
        prompt
    };
    ContentItem {
        id: Uuid::new_v4().to_string(),
        operation,
        operand1: a,
        operand2: b,
        prompt_text,
        correct_answer: answer,
        variant,
        tier_generated: clamp_tier(tier as i64),
        explanation: explain(operation, a, b, answer),
    }
}

fn standard_prompt(operation: Operation, a: i64, b: i64) -> String {
    format!("{a} {} {b} = ?", operation.symbol())
}

fn word_prompt(operation: Operation, a: i64, b: i64, name: &str) -> String {
    match operation {
        Operation::Addition => {
            format!("{name} has {a} marbles and finds {b} more. How many marbles now?")
        }
        Operation::Subtraction => {
            format!("{name} had {a} stickers and gave away {b}. How many stickers are left?")
        }
        Operation::Multiplication => {
            format!("{name} packs {a} boxes with {b} pencils each. How many pencils in all?")
        }
        Operation::Division => format!(
            "{name} shares {a} cookies equally among {b} friends. How many does each get?"
        ),
    }
}
