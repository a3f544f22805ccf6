// Arithmetic fact generation for math drill worksheets

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "x",
            Operation::Div => "÷",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::Add => "Addition (+)",
            Operation::Sub => "Subtraction (-)",
            Operation::Mul => "Multiplication (x)",
            Operation::Div => "Division (÷)",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts symbols, short names, the English UI labels and the Thai ones.
impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let op = match key.as_str() {
            "+" | "add" | "addition" | "addition (+)" | "บวก" | "บวก (+)" => Operation::Add,
            "-" | "sub" | "subtract" | "subtraction" | "subtraction (-)" | "ลบ" | "ลบ (-)" => Operation::Sub,
            "x" | "*" | "×" | "mul" | "multiply" | "multiplication" | "multiplication (x)" | "คูณ" | "คูณ (x)"
            | "คูณ (×)" => Operation::Mul,
            "/" | "÷" | "div" | "divide" | "division" | "division (÷)" | "หาร" | "หาร (÷)" => Operation::Div,
            _ => return Err(format!("unknown operation '{}'", s)),
        };
        Ok(op)
    }
}

/// One drill item. For division `operand_a` is the back-computed dividend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MathFact {
    pub operand_a: i64,
    pub operand_b: i64,
    pub result: i64,
    pub operation: Operation,
}

impl MathFact {
    pub fn question(&self) -> String {
        format!("{} {} {} = ____", self.operand_a, self.operation.symbol(), self.operand_b)
    }

    pub fn answer(&self) -> String {
        self.result.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MathFactGenerator {
    seed: Option<u64>,
}

impl MathFactGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Fill-in-the-blank questions paired with their answers.
    pub fn generate(&self, operation: Operation, count: usize, min: i64, max: i64) -> (Vec<String>, Vec<String>) {
        self.facts(operation, count, min, max)
            .iter()
            .map(|fact| (fact.question(), fact.answer()))
            .unzip()
    }

    pub fn facts(&self, operation: Operation, count: usize, min: i64, max: i64) -> Vec<MathFact> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        generate_facts(&mut rng, operation, count, min, max)
    }
}

/// Largest operand magnitude; products of two operands stay well inside `i64`.
pub const OPERAND_LIMIT: i64 = 1_000_000_000;

/// Rejects ranges whose sums or products could overflow.
pub fn check_range(min: i64, max: i64) -> Result<(), String> {
    for bound in [min, max] {
        if !(-OPERAND_LIMIT..=OPERAND_LIMIT).contains(&bound) {
            return Err(format!(
                "operand {} is out of range (allowed -{} to {})",
                bound, OPERAND_LIMIT, OPERAND_LIMIT
            ));
        }
    }
    Ok(())
}

/// Draws `count` facts with operands in `[min, max]`.
///
/// Subtraction swaps operands so the result is never negative. Division picks
/// the quotient and divisor first and multiplies them into the dividend, so
/// the dividend may exceed `max`. A zero divisor is replaced by 1. Bounds
/// beyond [`OPERAND_LIMIT`] are clamped to it.
pub fn generate_facts<R: Rng>(rng: &mut R, operation: Operation, count: usize, min: i64, max: i64) -> Vec<MathFact> {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo = lo.clamp(-OPERAND_LIMIT, OPERAND_LIMIT);
    let hi = hi.clamp(-OPERAND_LIMIT, OPERAND_LIMIT);

    (0..count)
        .map(|_| {
            let a = rng.gen_range(lo..=hi);
            let b = rng.gen_range(lo..=hi);
            match operation {
                Operation::Add => MathFact { operand_a: a, operand_b: b, result: a + b, operation },
                Operation::Mul => MathFact { operand_a: a, operand_b: b, result: a * b, operation },
                Operation::Sub => {
                    let (a, b) = if a < b { (b, a) } else { (a, b) };
                    MathFact { operand_a: a, operand_b: b, result: a - b, operation }
                }
                Operation::Div => {
                    let divisor = if b == 0 { 1 } else { b };
                    let quotient = rng.gen_range(lo..=hi);
                    MathFact {
                        operand_a: quotient * divisor,
                        operand_b: divisor,
                        result: quotient,
                        operation,
                    }
                }
            }
        })
        .collect()
}
