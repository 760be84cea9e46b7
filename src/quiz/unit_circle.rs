use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use super::angle_range::AngleFormat;
use super::config::UnitCircleConfig;
use super::trig_table::{
    exact_value, format_decimal, radian_label, round3, ExactTrigValue, TrigFunction,
};
use super::{CanonicalAnswer, Detail, Module, Question};

pub const OPTION_COUNT: usize = 4;
const SAMPLING_ATTEMPTS: usize = 50;

const COMMON_FRACTIONS: [&str; 19] = [
    "0", "1/2", "√2/2", "√3/2", "1", "-1/2", "-√2/2", "-√3/2", "-1", "√3/3", "-√3/3", "2", "-2",
    "1/√2", "-1/√2", "√2", "-√2", "√3", "-√3",
];

const COMMON_DECIMALS: [f64; 19] = [
    0.0, 0.5, 0.707, 0.866, 1.0, -0.5, -0.707, -0.866, -1.0, 0.577, -0.577, 2.0, -2.0, 0.707,
    -0.707, 1.414, -1.414, 1.732, -1.732,
];

const DEFAULT_FRACTIONS: [&str; 8] = ["0", "1", "-1", "1/2", "√2/2", "√3/2", "1/√2", "√3/3"];
const DEFAULT_DECIMALS: [f64; 8] = [0.0, 1.0, -1.0, 0.5, 0.707, 0.866, 0.707, 0.577];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnswerFormat {
    #[default]
    Fractions,
    Decimal,
}

/// One multiple-choice value. Options of a question are all of one variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TrigAnswer {
    Exact(String),
    Decimal(f64),
}

impl fmt::Display for TrigAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrigAnswer::Exact(exact) => write!(f, "{}", exact),
            TrigAnswer::Decimal(value) => write!(f, "{}", format_decimal(*value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnitCircleDetail {
    pub angle_degrees: f64,
    pub function: TrigFunction,
    pub angle_format: AngleFormat,
    pub answer_format: AnswerFormat,
    pub value: ExactTrigValue,
    pub options: Vec<TrigAnswer>,
}

impl UnitCircleDetail {
    pub fn angle_label(&self) -> String {
        match self.angle_format {
            AngleFormat::Degrees => format!("{}°", self.angle_degrees),
            AngleFormat::Radians => radian_label(self.angle_degrees),
        }
    }

    /// One-line stand-in for the unit-circle drawing.
    pub fn diagram_caption(&self) -> String {
        let quadrant = match self.angle_degrees.round() as i64 {
            0 | 180 => "on the x-axis",
            90 | 270 => "on the y-axis",
            a if a < 90 => "in quadrant I",
            a if a < 180 => "in quadrant II",
            a if a < 270 => "in quadrant III",
            _ => "in quadrant IV",
        };
        format!("◯ radius drawn at {}, {}", self.angle_label(), quadrant)
    }
}

fn canonical_answer(value: &ExactTrigValue, format: AnswerFormat) -> TrigAnswer {
    match format {
        AnswerFormat::Fractions => TrigAnswer::Exact(value.exact.clone()),
        AnswerFormat::Decimal => TrigAnswer::Decimal(round3(value.decimal)),
    }
}

/// Builds the question for a fixed angle and function.
pub fn question_for<R: Rng + ?Sized>(
    angle_degrees: f64,
    function: TrigFunction,
    angle_format: AngleFormat,
    answer_format: AnswerFormat,
    rng: &mut R,
) -> Question {
    let value = exact_value(angle_degrees, function);
    let answer = canonical_answer(&value, answer_format);
    let detail = UnitCircleDetail {
        angle_degrees,
        function,
        angle_format,
        answer_format,
        options: options(&answer, answer_format, rng),
        value,
    };
    let text = format!("What is {}({})?", function.name(), detail.angle_label());

    Question::new(
        Module::UnitCircle,
        text,
        CanonicalAnswer::Choice(answer),
        Detail::UnitCircle(detail),
    )
}

pub fn generate<R: Rng + ?Sized>(config: &mut UnitCircleConfig, rng: &mut R) -> Question {
    let mut range = config.resolved_range();
    let angles = range.eligible_angles();
    config.reflect(&range);

    let function = TrigFunction::ALL[rng.gen_range(0..TrigFunction::ALL.len())];
    let angle = angles[rng.gen_range(0..angles.len())];

    question_for(
        f64::from(angle),
        function,
        config.angle_format,
        config.answer_format,
        rng,
    )
}

/// Exactly four distinct options in the answer's format, shuffled, one of them `correct`.
pub fn options<R: Rng + ?Sized>(
    correct: &TrigAnswer,
    format: AnswerFormat,
    rng: &mut R,
) -> Vec<TrigAnswer> {
    let mut options = vec![correct.clone()];

    let sample = |rng: &mut R| match format {
        AnswerFormat::Fractions => {
            TrigAnswer::Exact(COMMON_FRACTIONS[rng.gen_range(0..COMMON_FRACTIONS.len())].to_string())
        }
        AnswerFormat::Decimal => {
            TrigAnswer::Decimal(COMMON_DECIMALS[rng.gen_range(0..COMMON_DECIMALS.len())])
        }
    };
    let mut attempts = 0;
    while options.len() < OPTION_COUNT && attempts < SAMPLING_ATTEMPTS {
        let option = sample(&mut *rng);
        if !options.contains(&option) {
            options.push(option);
        }
        attempts += 1;
    }

    while options.len() < OPTION_COUNT {
        let slot = options.len() - 1;
        let candidate = match format {
            AnswerFormat::Fractions => {
                TrigAnswer::Exact(DEFAULT_FRACTIONS.get(slot).copied().unwrap_or("0").to_string())
            }
            AnswerFormat::Decimal => {
                TrigAnswer::Decimal(DEFAULT_DECIMALS.get(slot).copied().unwrap_or(0.0))
            }
        };
        let option = if options.contains(&candidate) {
            log::debug!("Option pool exhausted, disambiguating {}", candidate);
            disambiguate(&candidate, &options)
        } else {
            candidate
        };
        options.push(option);
    }

    options.shuffle(rng);
    options
}

/// Tags a fraction or nudges a decimal until it differs from every existing option.
fn disambiguate(candidate: &TrigAnswer, existing: &[TrigAnswer]) -> TrigAnswer {
    let mut step = existing.len();
    loop {
        let option = match candidate {
            TrigAnswer::Exact(exact) => TrigAnswer::Exact(format!("{}_{}", exact, step)),
            TrigAnswer::Decimal(value) => TrigAnswer::Decimal(round3(value + step as f64 * 0.001)),
        };
        if !existing.contains(&option) {
            return option;
        }
        step += 1;
    }
}

/// Maps a tapped label back to the option it was rendered from.
pub fn find_option<'a>(options: &'a [TrigAnswer], label: &str) -> Option<&'a TrigAnswer> {
    let label = label.trim();
    options.iter().find(|option| option.to_string() == label)
}
