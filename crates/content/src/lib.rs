//! Content variant generation for mathtier.
//!
//! Given an operation and a tier, produce a concrete problem whose operands
//! stay inside the tier's operand range and whose stored answer agrees with
//! the operator. Randomness only decides which operands are picked.

pub mod explanation;
pub mod generator;
pub mod parse;

pub use explanation::explain;
pub use generator::{build_item, generate_anonymous, generate_item, generate_operands};
pub use parse::parse_problem_text;
