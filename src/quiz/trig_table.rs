use std::f64::consts::PI;

/// The sixteen multiples of 30° and 45° in [0, 360) with tabulated exact values.
pub const CANONICAL_ANGLES: [u32; 16] = [
    0, 30, 45, 60, 90, 120, 135, 150, 180, 210, 225, 240, 270, 300, 315, 330,
];

const SIN_VALUES: [&str; 16] = [
    "0", "1/2", "√2/2", "√3/2", "1", "√3/2", "√2/2", "1/2", "0", "-1/2", "-√2/2", "-√3/2", "-1",
    "-√3/2", "-√2/2", "-1/2",
];

const COS_VALUES: [&str; 16] = [
    "1", "√3/2", "√2/2", "1/2", "0", "-1/2", "-√2/2", "-√3/2", "-1", "-√3/2", "-√2/2", "-1/2",
    "0", "1/2", "√2/2", "√3/2",
];

const TAN_VALUES: [&str; 16] = [
    "0", "√3/3", "1", "√3", "undefined", "-√3", "-1", "-√3/3", "0", "√3/3", "1", "√3",
    "undefined", "-√3", "-1", "-√3/3",
];

const RADIAN_LABELS: [&str; 16] = [
    "0", "π/6", "π/4", "π/3", "π/2", "2π/3", "3π/4", "5π/6", "π", "7π/6", "5π/4", "4π/3", "3π/2",
    "5π/3", "7π/4", "11π/6",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrigFunction {
    Sin,
    Cos,
    Tan,
}

impl TrigFunction {
    pub const ALL: [TrigFunction; 3] = [TrigFunction::Sin, TrigFunction::Cos, TrigFunction::Tan];

    pub fn name(&self) -> &'static str {
        match self {
            TrigFunction::Sin => "sin",
            TrigFunction::Cos => "cos",
            TrigFunction::Tan => "tan",
        }
    }

    pub fn apply(&self, radians: f64) -> f64 {
        match self {
            TrigFunction::Sin => radians.sin(),
            TrigFunction::Cos => radians.cos(),
            TrigFunction::Tan => radians.tan(),
        }
    }

    fn table(&self) -> &'static [&'static str; 16] {
        match self {
            TrigFunction::Sin => &SIN_VALUES,
            TrigFunction::Cos => &COS_VALUES,
            TrigFunction::Tan => &TAN_VALUES,
        }
    }
}

/// A trig value both as a float and as a closed-form string.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExactTrigValue {
    pub decimal: f64,
    pub exact: String,
}

fn canonical_index(angle_degrees: i64) -> Option<usize> {
    CANONICAL_ANGLES
        .iter()
        .position(|&angle| i64::from(angle) == angle_degrees)
}

/// Looks up `function(angle)`; the angle is rounded to whole degrees first so
/// values that drifted through a radians round-trip still hit the table.
pub fn exact_value(angle_degrees: f64, function: TrigFunction) -> ExactTrigValue {
    let angle = angle_degrees.round();
    let decimal = function.apply(angle * PI / 180.0);
    let exact = match canonical_index(angle as i64) {
        Some(index) => function.table()[index].to_string(),
        None => format_decimal(decimal),
    };
    ExactTrigValue { decimal, exact }
}

pub fn round3(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    // keeps -0.0 from displaying as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn format_decimal(value: f64) -> String {
    round3(value).to_string()
}

/// `π/3` for 60°, `2π` for a full turn, three decimals of radians otherwise.
pub fn radian_label(angle_degrees: f64) -> String {
    let rounded = angle_degrees.round();
    if (angle_degrees - rounded).abs() < 1e-9 {
        if rounded == 360.0 {
            return "2π".to_string();
        }
        if let Some(index) = canonical_index(rounded as i64) {
            return RADIAN_LABELS[index].to_string();
        }
    }
    format!("{:.3}", angle_degrees * PI / 180.0)
}
