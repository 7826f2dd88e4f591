use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest operand (and quotient) a generated problem uses
pub const MAX_OPERAND: i64 = 9;

/// The four arithmetic modes a quiz can drill
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "×",
            Operation::Divide => "÷",
        }
    }

    /// Human readable name for result screens
    pub fn long_name(&self) -> &'static str {
        match self {
            Operation::Add => "Addition",
            Operation::Subtract => "Subtraction",
            Operation::Multiply => "Multiplication",
            Operation::Divide => "Division",
        }
    }
}

/// A single question shown to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub display_text: String,
    pub correct_answer: i64,
}

impl Problem {
    /// Build a problem from already drawn operands.
    ///
    /// Subtraction swaps the operands when `b > a` so the answer is never
    /// negative; the swapped order is what gets displayed. Division expects
    /// `b != 0` and `a` to be a multiple of `b`, which `draw_operands` guarantees.
    pub(crate) fn from_operands(operation: Operation, a: i64, b: i64) -> Self {
        let (a, b) = match operation {
            Operation::Subtract if b > a => (b, a),
            _ => (a, b),
        };

        let correct_answer = match operation {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide => {
                debug_assert!(b != 0 && a % b == 0, "inexact division {a} / {b}");
                a.checked_div(b).unwrap_or(0)
            }
        };

        Self {
            display_text: format!("{} {} {} = ?", a, operation.symbol(), b),
            correct_answer,
        }
    }
}

/// Draw the raw operands for `operation`.
///
/// For division the dividend is built from the divisor and the intended
/// quotient, so the result is always an exact integer.
pub fn draw_operands<R: Rng + ?Sized>(operation: Operation, rng: &mut R) -> (i64, i64) {
    let a = rng.gen_range(0..=MAX_OPERAND);
    let b = rng.gen_range(0..=MAX_OPERAND);

    match operation {
        Operation::Divide => {
            let divisor = rng.gen_range(1..=MAX_OPERAND);
            let quotient = rng.gen_range(0..=MAX_OPERAND);
            (divisor * quotient, divisor)
        }
        _ => (a, b),
    }
}

/// Generate the next problem for `operation`. Only consumes RNG state.
pub fn generate<R: Rng + ?Sized>(operation: Operation, rng: &mut R) -> Problem {
    let (a, b) = draw_operands(operation, rng);
    Problem::from_operands(operation, a, b)
}
