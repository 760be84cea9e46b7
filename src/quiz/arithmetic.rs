use rand::Rng;

use super::config::ArithmeticConfig;
use super::{CanonicalAnswer, Detail, Module, Question};

/// Largest operand accepted from the configuration; keeps `a²` and `a·b` small.
pub const MAX_OPERAND: i64 = 10_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Squaring,
    SquareRoot,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
        Operation::Squaring,
        Operation::SquareRoot,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "−",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
            Operation::Squaring => "x²",
            Operation::SquareRoot => "√x",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "+" => Some(Operation::Addition),
            "−" | "-" => Some(Operation::Subtraction),
            "×" | "*" => Some(Operation::Multiplication),
            "÷" | "/" => Some(Operation::Division),
            "x²" | "^2" => Some(Operation::Squaring),
            "√x" | "√" => Some(Operation::SquareRoot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticProblem {
    pub operation: Operation,
    pub left: i64,
    pub right: Option<i64>,
    pub answer: i64,
}

impl ArithmeticProblem {
    pub fn text(&self) -> String {
        let right = self.right.unwrap_or_default();
        match self.operation {
            Operation::Addition => format!("{} + {} = ?", self.left, right),
            Operation::Subtraction => format!("{} - {} = ?", self.left, right),
            Operation::Multiplication => format!("{} × {} = ?", self.left, right),
            Operation::Division => format!("{} ÷ {} = ?", self.left, right),
            Operation::Squaring => format!("{}² = ?", self.left),
            Operation::SquareRoot => format!("√{} = ?", self.left),
        }
    }

    pub fn into_question(self) -> Question {
        Question::new(
            Module::Arithmetic,
            self.text(),
            CanonicalAnswer::Integer(self.answer),
            Detail::Arithmetic {
                operation: self.operation,
            },
        )
    }
}

pub fn generate<R: Rng + ?Sized>(config: &ArithmeticConfig, rng: &mut R) -> ArithmeticProblem {
    let (min, max) = config.bounds();
    let operators: Vec<Operation> = if config.operators.is_empty() {
        vec![Operation::Addition]
    } else {
        config.operators.iter().copied().collect()
    };
    let operation = operators[rng.gen_range(0..operators.len())];

    match operation {
        Operation::Addition => {
            let (a, b) = (rng.gen_range(min..=max), rng.gen_range(min..=max));
            ArithmeticProblem {
                operation,
                left: a,
                right: Some(b),
                answer: a + b,
            }
        }
        Operation::Subtraction => {
            let a = rng.gen_range(min..=max);
            let b = rng.gen_range(min..=a);
            ArithmeticProblem {
                operation,
                left: a,
                right: Some(b),
                answer: a - b,
            }
        }
        Operation::Multiplication => {
            let (a, b) = (rng.gen_range(min..=max), rng.gen_range(min..=max));
            ArithmeticProblem {
                operation,
                left: a,
                right: Some(b),
                answer: a * b,
            }
        }
        Operation::Division => {
            // built from divisor and quotient so the division is always exact
            let divisor = rng.gen_range(min..=max);
            let quotient = rng.gen_range(min..=max);
            ArithmeticProblem {
                operation,
                left: divisor * quotient,
                right: Some(divisor),
                answer: quotient,
            }
        }
        Operation::Squaring => {
            let a = rng.gen_range(min..=max);
            ArithmeticProblem {
                operation,
                left: a,
                right: None,
                answer: a * a,
            }
        }
        Operation::SquareRoot => {
            let root = rng.gen_range(min..=max);
            ArithmeticProblem {
                operation,
                left: root * root,
                right: None,
                answer: root,
            }
        }
    }
}

pub fn is_correct(submitted: &str, answer: i64) -> bool {
    submitted.trim().parse::<i64>() == Ok(answer)
}
