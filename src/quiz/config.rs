use std::collections::BTreeSet;

use super::angle_range::{resolve_range, AngleFormat, AngleRange};
use super::arithmetic::{Operation, MAX_OPERAND};
use super::derivatives::DerivativeKind;
use super::error::ConfigError;
use super::factoring::FactoringKind;
use super::unit_circle::AnswerFormat;
use super::Module;

const DEFAULT_MIN: i64 = 1;
const DEFAULT_MAX: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArithmeticConfig {
    pub min: i64,
    pub max: i64,
    pub operators: BTreeSet<Operation>,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            operators: BTreeSet::from([Operation::Addition]),
        }
    }
}

impl ArithmeticConfig {
    /// `(min, max)` clamped to `[1, MAX_OPERAND]` and put in order.
    pub fn bounds(&self) -> (i64, i64) {
        let min = self.min.clamp(1, MAX_OPERAND);
        let max = self.max.clamp(1, MAX_OPERAND);
        if min > max {
            (max, min)
        } else {
            (min, max)
        }
    }

    fn apply(&mut self, command: &str) -> Result<String, ConfigError> {
        if let Some(rest) = command.strip_prefix("range") {
            let mut bounds = rest.split_whitespace();
            let (Some(raw_min), Some(raw_max)) = (bounds.next(), bounds.next()) else {
                return Err(ConfigError::MissingBounds);
            };
            self.min = raw_min.parse().unwrap_or(DEFAULT_MIN);
            self.max = raw_max.parse().unwrap_or(DEFAULT_MAX);
            let (min, max) = self.bounds();
            return Ok(format!("Numbers from {} to {}", min, max));
        }

        let operation = Operation::from_label(command)
            .ok_or_else(|| ConfigError::UnknownSetting(command.to_string()))?;
        if !self.operators.remove(&operation) {
            self.operators.insert(operation);
        }
        Ok(format!("Operators: {}", self.operators_summary()))
    }

    pub fn operators_summary(&self) -> String {
        if self.operators.is_empty() {
            return "none (addition will be used)".to_string();
        }
        self.operators
            .iter()
            .map(Operation::label)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnitCircleConfig {
    pub angle_format: AngleFormat,
    pub answer_format: AnswerFormat,
    /// Bounds as typed, in `angle_format` units.
    pub range_min: String,
    pub range_max: String,
    pub show_diagram: bool,
}

impl Default for UnitCircleConfig {
    fn default() -> Self {
        Self {
            angle_format: AngleFormat::Degrees,
            answer_format: AnswerFormat::Fractions,
            range_min: "0".to_string(),
            range_max: "360".to_string(),
            show_diagram: true,
        }
    }
}

impl UnitCircleConfig {
    pub fn resolved_range(&self) -> AngleRange {
        resolve_range(&self.range_min, &self.range_max, self.angle_format)
    }

    /// Stores a resolved range back in the current units.
    pub fn reflect(&mut self, range: &AngleRange) {
        let (min, max) = range.to_raw(self.angle_format);
        self.range_min = min;
        self.range_max = max;
    }

    fn set_angle_format(&mut self, format: AngleFormat) {
        // the stored bounds are re-expressed so they keep meaning the same angles
        let range = self.resolved_range();
        self.angle_format = format;
        self.reflect(&range);
    }

    fn apply(&mut self, command: &str) -> Result<String, ConfigError> {
        match command {
            "degrees" => self.set_angle_format(AngleFormat::Degrees),
            "radians" => self.set_angle_format(AngleFormat::Radians),
            "fractions" => self.answer_format = AnswerFormat::Fractions,
            "decimals" | "decimal" => self.answer_format = AnswerFormat::Decimal,
            "diagram on" => self.show_diagram = true,
            "diagram off" => self.show_diagram = false,
            _ => {
                let Some(rest) = command.strip_prefix("range") else {
                    return Err(ConfigError::UnknownSetting(command.to_string()));
                };
                let mut bounds = rest.split_whitespace();
                let (Some(raw_min), Some(raw_max)) = (bounds.next(), bounds.next()) else {
                    return Err(ConfigError::MissingBounds);
                };
                let range = resolve_range(raw_min, raw_max, self.angle_format);
                self.reflect(&range);
            }
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> String {
        format!(
            "Angles in {}, answers as {}, range {} to {}, diagram {}",
            match self.angle_format {
                AngleFormat::Degrees => "degrees",
                AngleFormat::Radians => "radians",
            },
            match self.answer_format {
                AnswerFormat::Fractions => "fractions",
                AnswerFormat::Decimal => "decimals",
            },
            self.range_min,
            self.range_max,
            if self.show_diagram { "on" } else { "off" },
        )
    }
}

/// Everything the user can tune, one section per module.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DrillConfig {
    pub arithmetic: ArithmeticConfig,
    pub unit_circle: UnitCircleConfig,
    pub factoring: FactoringKind,
    pub derivatives: DerivativeKind,
}

impl DrillConfig {
    /// Applies one settings command typed or tapped by the user and returns
    /// a confirmation line. Unknown commands leave the configuration untouched.
    pub fn apply(&mut self, module: Module, command: &str) -> Result<String, ConfigError> {
        let command = command.trim().to_lowercase();
        match module {
            Module::Arithmetic => self.arithmetic.apply(&command),
            Module::UnitCircle => self.unit_circle.apply(&command),
            Module::Factoring => {
                self.factoring = FactoringKind::from_label(&command)
                    .ok_or_else(|| ConfigError::UnknownSetting(command.clone()))?;
                Ok(format!("Factoring: {}", self.factoring.label()))
            }
            Module::Derivatives => {
                self.derivatives = DerivativeKind::from_label(&command)
                    .ok_or_else(|| ConfigError::UnknownSetting(command.clone()))?;
                Ok(format!("Derivatives: {}", self.derivatives.label()))
            }
        }
    }
}
