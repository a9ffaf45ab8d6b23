//! The hint ladder.
//!
//! Wording lives in configuration (`practice.hints.ladder`); this module only
//! picks the rung for an attempt, fills placeholders, and guarantees a hint
//! is never repeated verbatim for the same item.

use mathtier_config::PracticeConfig;
use mathtier_core::{ContentItem, Operation, ParsedAnswer, check_answer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintPayload {
    /// 1-based ladder rung actually used.
    pub level: u32,
    pub attempt: u32,
    pub text: String,
    pub reveals_answer: bool,
    /// Situational remark (near miss, slow response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Build the hint for `attempt_number` (1-based).
///
/// Returns `None` when `user_answer` is already correct: hints are for
/// wrong answers only.
pub fn get_hint(
    item: &ContentItem,
    user_answer: &str,
    latency_ms: u64,
    attempt_number: u32,
    previous_hints: &[String],
    config: &PracticeConfig,
) -> Option<HintPayload> {
    if check_answer(item, user_answer) {
        return None;
    }
    let ladder = &config.hints.ladder;
    if ladder.is_empty() {
        return None;
    }

    let start = (attempt_number.max(1) as usize - 1).min(ladder.len() - 1);
    let decomposition = decomposition(item);

    let fresh = (start..ladder.len()).find_map(|idx| {
        let text = render(ladder[idx].templates.get(item.operation), item, &decomposition);
        (!previous_hints.contains(&text)).then_some((idx, text))
    });

    let (idx, text) = match fresh {
        Some(found) => found,
        None => {
            // Every remaining rung was already shown; number the repeat.
            let base = render(ladder[start].templates.get(item.operation), item, &decomposition);
            let mut n = previous_hints.len() + 1;
            loop {
                let candidate = format!("{base} (hint {n})");
                if !previous_hints.contains(&candidate) {
                    break (start, candidate);
                }
                n += 1;
            }
        }
    };

    Some(HintPayload {
        level: idx as u32 + 1,
        attempt: attempt_number.max(1),
        text,
        reveals_answer: ladder[idx].reveals_answer,
        note: note_for(item, user_answer, latency_ms, config),
    })
}

fn render(template: &str, item: &ContentItem, decomposition: &str) -> String {
    template
        .replace("{a}", &item.operand1.to_string())
        .replace("{b}", &item.operand2.to_string())
        .replace("{op}", item.operation.symbol())
        .replace("{answer}", &item.correct_answer.to_string())
        .replace("{decomposition}", decomposition)
}

fn note_for(
    item: &ContentItem,
    user_answer: &str,
    latency_ms: u64,
    config: &PracticeConfig,
) -> Option<String> {
    if let Some(value) = ParsedAnswer::parse(user_answer).value() {
        let diff = (value - item.correct_answer as f64).abs();
        if diff <= config.hints.near_miss_tolerance as f64 {
            return Some("You're close. Check your last step.".into());
        }
    }
    if latency_ms > config.coach.slow_latency_ms {
        return Some("No rush. Take it one step at a time.".into());
    }
    None
}

/// A concrete breakdown of the problem that stops one step short of the
/// answer.
pub fn decomposition(item: &ContentItem) -> String {
    let (a, b) = (item.operand1, item.operand2);
    let sym = item.operation.symbol();
    match item.operation {
        Operation::Addition | Operation::Subtraction => {
            let (tens, ones) = (b - b % 10, b % 10);
            let partial = item.operation.apply(a, tens);
            if b < 10 {
                let dir = if item.operation == Operation::Addition { "up" } else { "back" };
                format!("start at {a} and count {dir} {b}.")
            } else if ones == 0 {
                format!("{a} {sym} {b} moves {a} by {} tens.", b / 10)
            } else {
                format!("{a} {sym} {tens} = {partial}, then {partial} {sym} {ones} = ?")
            }
        }
        Operation::Multiplication => {
            let (x, y) = if a >= b { (a, b) } else { (b, a) };
            if x >= 10 && x % 10 != 0 {
                let (tens, ones) = (x - x % 10, x % 10);
                format!(
                    "{y} × {tens} = {}, and {y} × {ones} = {}. Add them together.",
                    y.saturating_mul(tens),
                    y.saturating_mul(ones)
                )
            } else if x >= 10 {
                format!("{y} × {} = {}, then multiply by 10.", x / 10, y.saturating_mul(x / 10))
            } else if x >= 2 {
                format!("{} × {y} = {}, then add one more {y}.", x - 1, (x - 1).saturating_mul(y))
            } else {
                format!("{y} × 1 leaves {y} unchanged.")
            }
        }
        Operation::Division => {
            if b == 0 {
                return "Dividing by zero has no answer.".into();
            }
            let ten_b = b.saturating_mul(10);
            if a >= ten_b {
                format!(
                    "{b} × 10 = {ten_b}, and {} is left to share by {b}.",
                    a.saturating_sub(ten_b)
                )
            } else {
                format!(
                    "Count by {b}s: {b}, {}, {}, ... until you reach {a}.",
                    b.saturating_mul(2),
                    b.saturating_mul(3)
                )
            }
        }
    }
}
