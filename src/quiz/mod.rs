pub mod angle_range;
pub mod arithmetic;
pub mod config;
pub mod derivatives;
pub mod error;
pub mod expr;
pub mod factoring;
pub mod polynomial;
pub mod session;
pub mod trig_table;
pub mod unit_circle;

use std::fmt;

use rand::Rng;

use arithmetic::Operation;
use config::DrillConfig;
use derivatives::DerivativeKind;
use factoring::FactoringKind;
use unit_circle::{TrigAnswer, UnitCircleDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Module {
    Arithmetic,
    UnitCircle,
    Factoring,
    Derivatives,
}

impl Module {
    pub const ALL: [Module; 4] = [
        Module::Arithmetic,
        Module::UnitCircle,
        Module::Factoring,
        Module::Derivatives,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Module::Arithmetic => "Arithmetic",
            Module::UnitCircle => "Unit circle",
            Module::Factoring => "Factoring",
            Module::Derivatives => "Derivatives",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|module| module.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CanonicalAnswer {
    Integer(i64),
    Expression(String),
    Choice(TrigAnswer),
}

impl fmt::Display for CanonicalAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalAnswer::Integer(n) => write!(f, "{}", n),
            CanonicalAnswer::Expression(expression) => write!(f, "{}", expression),
            CanonicalAnswer::Choice(choice) => write!(f, "{}", choice),
        }
    }
}

/// What a module needs to remember about a question beyond its text and answer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Detail {
    Arithmetic { operation: Operation },
    UnitCircle(UnitCircleDetail),
    Factoring { kind: FactoringKind },
    Derivatives { kind: DerivativeKind },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    /// Assigned by the session; 0 until then.
    pub id: u64,
    pub module: Module,
    pub text: String,
    pub answer: CanonicalAnswer,
    pub detail: Detail,
}

impl Question {
    pub fn new(module: Module, text: String, answer: CanonicalAnswer, detail: Detail) -> Self {
        Self {
            id: 0,
            module,
            text,
            answer,
            detail,
        }
    }

    /// The multiple-choice options; empty for free-form modules.
    pub fn options(&self) -> &[TrigAnswer] {
        match &self.detail {
            Detail::UnitCircle(detail) => &detail.options,
            _ => &[],
        }
    }

    pub fn check(&self, submitted: &str) -> Verdict {
        let correct = match (self.module, &self.answer) {
            (Module::Arithmetic, CanonicalAnswer::Integer(expected)) => {
                arithmetic::is_correct(submitted, *expected)
            }
            (Module::UnitCircle, CanonicalAnswer::Choice(_)) => {
                unit_circle::find_option(self.options(), submitted)
                    .is_some_and(|option| self.is_choice_correct(option))
            }
            (Module::Factoring, CanonicalAnswer::Expression(expected)) => {
                factoring::is_equivalent(submitted, expected)
            }
            (Module::Derivatives, CanonicalAnswer::Expression(expected)) => {
                derivatives::is_equivalent(submitted, expected)
            }
            _ => false,
        };
        Verdict {
            correct,
            correct_answer: self.answer.to_string(),
        }
    }

    /// Compares a selected option by value, not by its label.
    pub fn is_choice_correct(&self, selected: &TrigAnswer) -> bool {
        matches!(&self.answer, CanonicalAnswer::Choice(expected) if expected == selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub correct_answer: String,
}

impl Verdict {
    pub fn message(&self) -> String {
        if self.correct {
            "Correct!".to_string()
        } else {
            format!("Incorrect. The answer is {}.", self.correct_answer)
        }
    }
}

/// Builds a fresh question for `module` from the current configuration.
/// The unit-circle generator may write a collapsed angle range back into `config`.
pub fn generate<R: Rng + ?Sized>(module: Module, config: &mut DrillConfig, rng: &mut R) -> Question {
    match module {
        Module::Arithmetic => arithmetic::generate(&config.arithmetic, rng).into_question(),
        Module::UnitCircle => unit_circle::generate(&mut config.unit_circle, rng),
        Module::Factoring => factoring::generate(config.factoring, rng).into_question(),
        Module::Derivatives => derivatives::generate(config.derivatives, rng).into_question(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_module_generates_a_checkable_question() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut config = DrillConfig::default();
        for module in Module::ALL {
            for _ in 0..50 {
                let question = generate(module, &mut config, &mut rng);
                assert_eq!(question.module, module);
                let verdict = question.check(&question.answer.to_string());
                assert!(verdict.correct, "{:?}: {}", module, question.text);
            }
        }
    }

    #[test]
    fn test_factoring_check_accepts_reordered_factors() {
        let question = Question::new(
            Module::Factoring,
            "Factor: x² - 9".to_string(),
            CanonicalAnswer::Expression("(x + 3)(x - 3)".to_string()),
            Detail::Factoring {
                kind: FactoringKind::DifferenceOfSquares,
            },
        );
        assert!(question.check("(x-3)(x+3)").correct);
        let verdict = question.check("(x-3)(x-3)");
        assert!(!verdict.correct);
        assert_eq!(verdict.message(), "Incorrect. The answer is (x + 3)(x - 3).");
    }

    #[test]
    fn test_unit_circle_check_uses_option_values() {
        let mut rng = StdRng::seed_from_u64(32);
        let question = unit_circle::question_for(
            60.0,
            trig_table::TrigFunction::Cos,
            angle_range::AngleFormat::Degrees,
            unit_circle::AnswerFormat::Fractions,
            &mut rng,
        );
        assert!(question.check("1/2").correct);
        assert!(question.is_choice_correct(&TrigAnswer::Exact("1/2".to_string())));
        let wrong = question
            .options()
            .iter()
            .find(|option| option.to_string() != "1/2")
            .unwrap();
        assert!(!question.check(&wrong.to_string()).correct);
        assert!(!question.check("not an option").correct);
    }

    #[test]
    fn test_module_labels_round_trip() {
        for module in Module::ALL {
            assert_eq!(Module::from_label(module.label()), Some(module));
        }
        assert_eq!(Module::from_label("Geometry"), None);
    }
}
