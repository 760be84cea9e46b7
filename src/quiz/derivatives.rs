use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use super::expr;
use super::polynomial::Linear;
use super::{CanonicalAnswer, Detail, Module, Question};

/// Points at which submitted and expected derivatives are compared.
pub const SAMPLE_POINTS: [f64; 5] = [-3.0, -1.0, 0.0, 1.0, 2.0];
pub const TOLERANCE: f64 = 1e-6;

static UNIT_EXPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([x)])\^1([^0-9.]|$)").unwrap());
/// A `1` multiplying what follows; after `/` or `^` it is an operand and must stay.
static UNIT_COEFFICIENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[+\-*(])1([x(])").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DerivativeKind {
    #[default]
    Power,
    Product,
    Chain,
}

impl DerivativeKind {
    pub const ALL: [DerivativeKind; 3] = [
        DerivativeKind::Power,
        DerivativeKind::Product,
        DerivativeKind::Chain,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DerivativeKind::Power => "Power rule",
            DerivativeKind::Product => "Product rule",
            DerivativeKind::Chain => "Chain rule",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativeProblem {
    pub kind: DerivativeKind,
    pub function: String,
    pub answer: String,
}

impl DerivativeProblem {
    pub fn into_question(self) -> Question {
        Question::new(
            Module::Derivatives,
            format!("Find the derivative: {}", self.function),
            CanonicalAnswer::Expression(self.answer),
            Detail::Derivatives { kind: self.kind },
        )
    }
}

/// `kx^n`, written `kx` when `n` is 1 and `x^n` when `k` is 1.
fn monomial(coefficient: i64, power: i64) -> String {
    let coefficient = if coefficient == 1 {
        String::new()
    } else {
        coefficient.to_string()
    };
    if power == 1 {
        format!("{}x", coefficient)
    } else {
        format!("{}x^{}", coefficient, power)
    }
}

fn power_of(base: &Linear, power: i64) -> String {
    if power == 1 {
        format!("({})", base)
    } else {
        format!("({})^{}", base, power)
    }
}

pub fn generate<R: Rng + ?Sized>(kind: DerivativeKind, rng: &mut R) -> DerivativeProblem {
    match kind {
        DerivativeKind::Power => {
            let coefficient = rng.gen_range(1..=5);
            let power = rng.gen_range(2..=6);
            DerivativeProblem {
                kind,
                function: monomial(coefficient, power),
                answer: monomial(coefficient * power, power - 1),
            }
        }
        DerivativeKind::Product => {
            let (a, b) = (rng.gen_range(1..=3), rng.gen_range(1..=3));
            // d/dx (ax + 1)(bx + 2) = 2ab·x + (2a + b)
            DerivativeProblem {
                kind,
                function: format!("({})({})", Linear::new(a, 1), Linear::new(b, 2)),
                answer: format!("{}x + {}", 2 * a * b, 2 * a + b),
            }
        }
        DerivativeKind::Chain => {
            let inner = Linear::new(rng.gen_range(1..=3), 1);
            let power = rng.gen_range(2..=4);
            DerivativeProblem {
                kind,
                function: power_of(&inner, power),
                answer: format!(
                    "{}{}",
                    power * inner.coefficient,
                    power_of(&inner, power - 1)
                ),
            }
        }
    }
}

fn compact(answer: &str) -> String {
    answer
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Drops whitespace, `^1` exponents and unit coefficients.
fn normalize(answer: &str) -> String {
    let mut normalized = compact(answer);
    loop {
        let next = UNIT_EXPONENT_RE
            .replace_all(&normalized, "${1}${2}")
            .into_owned();
        let next = UNIT_COEFFICIENT_RE.replace_all(&next, "${1}${2}").into_owned();
        if next == normalized {
            return normalized;
        }
        normalized = next;
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || "x+-*/().^".contains(c)
}

/// Evaluates both expressions at [`SAMPLE_POINTS`]. Any parse failure or
/// non-finite value counts as a mismatch.
///
/// Agreement on five points is evidence, not proof: two different functions
/// that happen to coincide there are accepted.
fn agrees_numerically(submitted: &str, canonical: &str) -> bool {
    if !submitted.chars().all(is_allowed) {
        return false;
    }
    let (Ok(submitted), Ok(canonical)) = (expr::parse(submitted), expr::parse(canonical)) else {
        return false;
    };

    SAMPLE_POINTS.iter().all(|&x| {
        let (got, expected) = (submitted.eval(x), canonical.eval(x));
        got.is_finite() && expected.is_finite() && (got - expected).abs() <= TOLERANCE
    })
}

/// String equality after [`normalize`], otherwise numeric agreement of the
/// answers as typed (minus whitespace).
pub fn is_equivalent(submitted: &str, canonical: &str) -> bool {
    normalize(submitted) == normalize(canonical)
        || agrees_numerically(&compact(submitted), &compact(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_exponent_is_collapsed() {
        assert!(is_equivalent("6x", "6x^1"));
        assert_eq!(normalize("6x^1"), "6x");
        assert_eq!(normalize("x^12"), "x^12");
        assert_eq!(normalize("4(x + 1)^1"), "4(x+1)");
    }

    #[test]
    fn test_unit_coefficient_is_collapsed() {
        assert_eq!(normalize("1x^2 + 1(x+1)"), "x^2+(x+1)");
        assert_eq!(normalize("11x + 21x"), "11x+21x");
        assert_eq!(normalize("0.1x"), "0.1x");
        assert_eq!(normalize("-1x+2*1x"), "-x+2*x");
    }

    #[test]
    fn test_one_after_division_or_exponent_is_kept() {
        assert_eq!(normalize("x/1x"), "x/1x");
        assert_eq!(normalize("2^1x"), "2^1x");
        assert!(is_equivalent("x/1x", "x^2"));
        assert!(is_equivalent("2^1x", "2x"));
        assert!(!is_equivalent("x/1x", "1"));
    }

    #[test]
    fn test_semantic_equivalence() {
        assert!(is_equivalent("2x+3", "3+2x"));
        assert!(is_equivalent("6(2x+1)^2", "24x^2 + 24x + 6"));
        assert!(is_equivalent("2*3*x^2", "6x^2"));
    }

    #[test]
    fn test_wrong_answers_are_rejected() {
        assert!(!is_equivalent("2x+3", "2x+4"));
        assert!(!is_equivalent("12x^2", "12x^3"));
        assert!(!is_equivalent("", "6x"));
    }

    #[test]
    fn test_malformed_input_is_incorrect_not_an_error() {
        assert!(!is_equivalent("2y+3", "2x+3"));
        assert!(!is_equivalent("2x+", "2x"));
        assert!(!is_equivalent("sqrt(x)", "x"));
        // x = 0 is a sample point, so 1/x never evaluates finitely everywhere
        assert!(!agrees_numerically("1/x", "1/x"));
    }

    #[test]
    fn test_deeply_nested_input_is_incorrect() {
        let nested = format!("{}x{}", "(".repeat(5000), ")".repeat(5000));
        assert!(!is_equivalent(&nested, "x"));
        assert!(!is_equivalent(&format!("{}x", "-".repeat(4000)), "x"));
        assert!(!is_equivalent(&format!("{}x{}", "(".repeat(300), ")".repeat(300)), "x"));
    }

    #[test]
    fn test_power_rule_answers() {
        assert_eq!(monomial(3, 4), "3x^4");
        assert_eq!(monomial(1, 2), "x^2");
        assert_eq!(monomial(6, 1), "6x");

        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..500 {
            let problem = generate(DerivativeKind::Power, &mut rng);
            assert!(!problem.answer.ends_with("^1"));
        }
    }

    #[test]
    fn test_product_and_chain_prompts() {
        assert_eq!(
            format!("({})({})", Linear::new(1, 1), Linear::new(3, 2)),
            "(x + 1)(3x + 2)"
        );
        assert_eq!(power_of(&Linear::new(2, 1), 3), "(2x + 1)^3");
        assert_eq!(power_of(&Linear::new(2, 1), 1), "(2x + 1)");
    }

    /// Central differences of the prompt must match the canonical answer.
    #[test]
    fn test_answers_are_true_derivatives() {
        let mut rng = StdRng::seed_from_u64(22);
        let h = 1e-4;
        for kind in DerivativeKind::ALL {
            for _ in 0..300 {
                let problem = generate(kind, &mut rng);
                let function = expr::parse(&problem.function).unwrap();
                let derivative = expr::parse(&problem.answer).unwrap();
                for x in SAMPLE_POINTS {
                    let numeric = (function.eval(x + h) - function.eval(x - h)) / (2.0 * h);
                    let exact = derivative.eval(x);
                    assert!(
                        (numeric - exact).abs() <= 1e-3 * exact.abs().max(1.0),
                        "d/dx {} at {}: {} vs {}",
                        problem.function,
                        x,
                        numeric,
                        exact
                    );
                }
                assert!(is_equivalent(&problem.answer, &problem.answer));
            }
        }
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DerivativeKind::from_label("CHAIN RULE"), Some(DerivativeKind::Chain));
        assert_eq!(DerivativeKind::from_label("quotient rule"), None);
    }
}
