//! Short post-answer explanations.

use mathtier_core::Operation;

/// One-sentence explanation of `a op b = answer`. Never empty.
pub fn explain(operation: Operation, a: i64, b: i64, answer: i64) -> String {
    let sym = operation.symbol();
    match operation {
        Operation::Addition => {
            format!("{a} {sym} {b} = {answer}: start at {a} and count on {b}.")
        }
        Operation::Subtraction => {
            format!("{a} {sym} {b} = {answer}: taking {b} away from {a} leaves {answer}.")
        }
        Operation::Multiplication => {
            format!("{a} {sym} {b} = {answer}: {a} groups of {b} make {answer}.")
        }
        Operation::Division => {
            format!("{a} {sym} {b} = {answer}, because {b} × {answer} = {a}.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_explained_as_inverse_multiplication() {
        let text = explain(Operation::Division, 42, 7, 6);
        assert!(text.contains("7 × 6 = 42"));
    }

    #[test]
    fn explanations_are_never_empty() {
        for op in Operation::ALL {
            assert!(!explain(op, 3, 1, op.apply(3, 1)).is_empty());
        }
    }
}
