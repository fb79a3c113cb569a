use crate::settings::{OperandRange, Settings};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Sub,
        Operation::Mul,
        Operation::Div,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Sub => '\u{2212}',
            Operation::Mul => '\u{00D7}',
            Operation::Div => '\u{00F7}',
        }
    }
}

/// A single generated question. `a` and `b` are the operands as drawn from the
/// configured range, which for sub/div are not the numbers shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub operation: Operation,
    pub a: i64,
    pub b: i64,
    pub question: String,
    pub answer: i64,
    pub history: String,
}

impl Problem {
    fn new(operation: Operation, a: i64, b: i64) -> Self {
        let (left, right, answer) = match operation {
            Operation::Add => (a, b, a + b),
            // shown as total - a so the result is never negative
            Operation::Sub => (a + b, a, b),
            Operation::Mul => (a, b, a * b),
            // shown as product / a so the division is always exact
            Operation::Div => (a * b, a, b),
        };
        let symbol = operation.symbol();

        Self {
            operation,
            a,
            b,
            question: format!("{left} {symbol} {right} ="),
            answer,
            history: format!("{left} {symbol} {right} = {answer}"),
        }
    }

    /// Whether sanitized digit input is exactly the decimal answer.
    pub fn is_answered_by(&self, digits: &str) -> bool {
        digits == self.answer.to_string()
    }
}

fn draw_operands<R: Rng + ?Sized>(range: &OperandRange, rng: &mut R) -> (i64, i64) {
    let a = rng.gen_range(range.min_a.min(range.max_a)..=range.min_a.max(range.max_a));
    let b = rng.gen_range(range.min_b.min(range.max_b)..=range.min_b.max(range.max_b));
    (a, b)
}

/// Uniform pick among the enabled operations, `None` when none are enabled.
pub fn pick_operation<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Option<Operation> {
    let ops = settings.operations.enabled();
    if ops.is_empty() {
        return None;
    }
    let idx = (rng.gen::<f64>() * ops.len() as f64).floor() as usize;
    ops.get(idx.min(ops.len() - 1)).copied()
}

/// Build a problem for an explicit operation. Sub reuses the addition range
/// and div reuses the multiplication range.
pub fn generate_for<R: Rng + ?Sized>(op: Operation, settings: &Settings, rng: &mut R) -> Problem {
    let range = match op {
        Operation::Add | Operation::Sub => &settings.add_range,
        Operation::Mul | Operation::Div => &settings.mul_range,
    };
    let (a, b) = draw_operands(range, rng);
    Problem::new(op, a, b)
}

pub fn generate<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Option<Problem> {
    let op = pick_operation(settings, rng)?;
    Some(generate_for(op, settings, rng))
}
