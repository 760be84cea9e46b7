use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use super::polynomial::{Linear, Quadratic};
use super::{CanonicalAnswer, Detail, Module, Question};

/// `(expr)^2` or `(expr)²` with no nested parentheses inside.
static SQUARED_FACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)(?:\^2|²)").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FactoringKind {
    #[default]
    MonicQuadratic,
    NonMonicQuadratic,
    DifferenceOfSquares,
    PerfectSquare,
}

impl FactoringKind {
    pub const ALL: [FactoringKind; 4] = [
        FactoringKind::MonicQuadratic,
        FactoringKind::NonMonicQuadratic,
        FactoringKind::DifferenceOfSquares,
        FactoringKind::PerfectSquare,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FactoringKind::MonicQuadratic => "Monic quadratic",
            FactoringKind::NonMonicQuadratic => "Non-monic quadratic",
            FactoringKind::DifferenceOfSquares => "Difference of squares",
            FactoringKind::PerfectSquare => "Perfect square",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoringProblem {
    pub kind: FactoringKind,
    pub polynomial: Quadratic,
    pub factors: [Linear; 2],
}

impl FactoringProblem {
    fn new(kind: FactoringKind, first: Linear, second: Linear) -> Self {
        Self {
            kind,
            polynomial: first.times(&second),
            factors: [first, second],
        }
    }

    /// Perfect squares are written with an exponent, everything else as two factors.
    pub fn answer(&self) -> String {
        let [first, second] = &self.factors;
        if self.kind == FactoringKind::PerfectSquare {
            format!("({})²", first)
        } else {
            format!("({})({})", first, second)
        }
    }

    pub fn into_question(self) -> Question {
        Question::new(
            Module::Factoring,
            format!("Factor: {}", self.polynomial),
            CanonicalAnswer::Expression(self.answer()),
            Detail::Factoring { kind: self.kind },
        )
    }
}

/// Uniform over `[-9, -1] ∪ [1, 9]`.
fn non_zero_constant<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let magnitude = rng.gen_range(1..=9);
    if rng.gen_bool(0.5) {
        -magnitude
    } else {
        magnitude
    }
}

pub fn generate<R: Rng + ?Sized>(kind: FactoringKind, rng: &mut R) -> FactoringProblem {
    match kind {
        FactoringKind::MonicQuadratic => {
            let (b, d) = (non_zero_constant(rng), non_zero_constant(rng));
            FactoringProblem::new(kind, Linear::new(1, b), Linear::new(1, d))
        }
        FactoringKind::NonMonicQuadratic => {
            let (a, c) = (rng.gen_range(2..=4), rng.gen_range(2..=4));
            let (b, d) = (non_zero_constant(rng), non_zero_constant(rng));
            FactoringProblem::new(kind, Linear::new(a, b), Linear::new(c, d))
        }
        FactoringKind::DifferenceOfSquares => {
            let n = rng.gen_range(1..=10);
            FactoringProblem::new(kind, Linear::new(1, n), Linear::new(1, -n))
        }
        FactoringKind::PerfectSquare => {
            let coefficient = rng.gen_range(1..=3);
            let constant = rng.gen_range(1..=10);
            let factor = Linear::new(coefficient, constant);
            FactoringProblem::new(kind, factor, factor)
        }
    }
}

/// Reduces a factored form to a canonical string: factor order and `(f)²`
/// versus `(f)(f)` no longer matter.
fn normalize(answer: &str) -> String {
    let mut normalized: String = answer
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .replace('−', "-")
        .replace(['×', '·', '∙', '*'], "");

    loop {
        let collapsed = normalized
            .replace("+-", "-")
            .replace("-+", "-")
            .replace("--", "+")
            .replace("++", "+");
        if collapsed == normalized {
            break;
        }
        normalized = collapsed;
    }

    loop {
        let expanded = SQUARED_FACTOR_RE
            .replace_all(&normalized, "($1)($1)")
            .into_owned();
        if expanded == normalized {
            break;
        }
        normalized = expanded;
    }

    let mut factors = Vec::new();
    let mut rest = String::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in normalized.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    factors.push(&normalized[start..=i]);
                }
            }
            _ if depth == 0 => rest.push(c),
            _ => {}
        }
    }
    if depth != 0 || factors.is_empty() {
        return normalized;
    }

    factors.sort_unstable();
    // anything outside the factors (a leading coefficient, say) is kept in front
    rest + &factors.concat()
}

pub fn is_equivalent(submitted: &str, canonical: &str) -> bool {
    normalize(submitted) == normalize(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::expr;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_factor_order_is_irrelevant() {
        assert!(is_equivalent("(x+3)(x-3)", "(x-3)(x+3)"));
        assert!(is_equivalent("(x - 3) (x + 3)", "(x + 3)(x - 3)"));
    }

    #[test]
    fn test_squared_forms_match_doubled_forms() {
        assert!(is_equivalent("(2x+1)^2", "(2x+1)(2x+1)"));
        assert!(is_equivalent("(2x + 1)²", "(2x+1)^2"));
    }

    #[test]
    fn test_sign_and_glyph_normalization() {
        assert!(is_equivalent("(x+-3)*(x+3)", "(x + 3)(x - 3)"));
        assert!(is_equivalent("(X−3)×(X--3)", "(x + 3)(x - 3)"));
    }

    #[test]
    fn test_wrong_answers_are_rejected() {
        assert!(!is_equivalent("(x+3)(x+3)", "(x + 3)(x - 3)"));
        assert!(!is_equivalent("2(x+3)(x-3)", "(x + 3)(x - 3)"));
        assert!(!is_equivalent("x^2-9", "(x + 3)(x - 3)"));
        assert!(!is_equivalent("(x+3)(x-3", "(x + 3)(x - 3)"));
    }

    #[test]
    fn test_prompts_and_answers() {
        let problem = FactoringProblem::new(
            FactoringKind::MonicQuadratic,
            Linear::new(1, 2),
            Linear::new(1, -5),
        );
        let question = problem.into_question();
        assert_eq!(question.text, "Factor: x² - 3x - 10");
        assert_eq!(
            question.answer,
            CanonicalAnswer::Expression("(x + 2)(x - 5)".to_string())
        );

        let square = FactoringProblem::new(
            FactoringKind::PerfectSquare,
            Linear::new(3, 4),
            Linear::new(3, 4),
        );
        assert_eq!(square.polynomial.to_string(), "9x² + 24x + 16");
        assert_eq!(square.answer(), "(3x + 4)²");
    }

    /// Expanding the answer string must give back the prompt's polynomial.
    fn assert_round_trip(problem: &FactoringProblem) {
        let answer = expr::parse(&problem.answer().replace('²', "^2")).unwrap();
        let prompt = expr::parse(&problem.polynomial.to_string().replace('²', "^2")).unwrap();
        for x in -3..=3 {
            let x = x as f64;
            assert_eq!(answer.eval(x), prompt.eval(x), "{} at x = {}", problem.answer(), x);
        }
    }

    #[test]
    fn test_round_trip_for_every_kind() {
        let mut rng = StdRng::seed_from_u64(11);
        for kind in FactoringKind::ALL {
            for _ in 0..1_000 {
                let problem = generate(kind, &mut rng);
                let [first, second] = problem.factors;
                assert_eq!(first.times(&second), problem.polynomial);
                assert_round_trip(&problem);
                assert!(is_equivalent(&problem.answer(), &problem.answer()));
            }
        }
    }

    #[test]
    fn test_generated_coefficients_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1_000 {
            let monic = generate(FactoringKind::MonicQuadratic, &mut rng);
            assert_eq!(monic.polynomial.a, 1);
            for factor in monic.factors {
                assert!(factor.constant != 0 && factor.constant.abs() <= 9);
            }

            let non_monic = generate(FactoringKind::NonMonicQuadratic, &mut rng);
            for factor in non_monic.factors {
                assert!((2..=4).contains(&factor.coefficient));
                assert!(factor.constant != 0 && factor.constant.abs() <= 9);
            }

            let difference = generate(FactoringKind::DifferenceOfSquares, &mut rng);
            assert_eq!(difference.polynomial.b, 0);
            assert!((-100..=-1).contains(&difference.polynomial.c));
        }
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            FactoringKind::from_label("perfect square"),
            Some(FactoringKind::PerfectSquare)
        );
        assert_eq!(FactoringKind::from_label("cubic"), None);
    }
}
