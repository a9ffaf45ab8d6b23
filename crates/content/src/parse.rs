//! Recover an equation from a caller-supplied prompt such as `"42 ÷ 7 = ?"`.

use mathtier_core::Operation;

const OPERATOR_CHARS: [char; 8] = ['+', '-', '−', '*', 'x', '×', '/', '÷'];

/// Largest operand accepted from caller text. Well above anything the
/// generator produces at tier 100.
pub const MAX_PARSED_OPERAND: i64 = 1_000_000;

/// Parse `"a op b"` (optionally followed by `= ?`). Operands must be
/// integers in `0..=MAX_PARSED_OPERAND`. Returns `None` for anything else.
pub fn parse_problem_text(text: &str) -> Option<(Operation, i64, i64)> {
    let equation = text.split('=').next()?.trim();
    if equation.is_empty() {
        return None;
    }

    // Skip the first character so a leading sign is never taken as the operator.
    let (idx, op_char) = equation
        .char_indices()
        .skip(1)
        .find(|(_, c)| OPERATOR_CHARS.contains(c))?;

    let left = equation[..idx].trim();
    let right = equation[idx + op_char.len_utf8()..].trim();
    let operation = Operation::from_symbol(&op_char.to_string())?;

    let a: i64 = left.parse().ok()?;
    let b: i64 = right.parse().ok()?;
    let range = 0..=MAX_PARSED_OPERAND;
    if !range.contains(&a) || !range.contains(&b) {
        return None;
    }
    Some((operation, a, b))
}
