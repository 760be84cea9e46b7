use super::expr;
use super::trig_table::{radian_label, CANONICAL_ANGLES};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AngleFormat {
    #[default]
    Degrees,
    Radians,
}

/// An inclusive range of angles in degrees, always within [0, 360] with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

fn is_radian_expression(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || "+-*/().π".contains(c) || c.is_whitespace())
}

/// Reads one bound typed by the user and returns it in degrees, or `None`
/// when nothing sensible can be made of it.
pub fn parse_bound(raw: &str, format: AngleFormat) -> Option<f64> {
    let raw = raw.trim();
    let value = match format {
        AngleFormat::Degrees => raw.parse::<f64>().ok(),
        AngleFormat::Radians => {
            let radians = if is_radian_expression(raw) {
                expr::eval_constant(raw).ok()
            } else {
                None
            };
            // micro-degree rounding so that π/2 lands exactly on 90
            radians
                .or_else(|| raw.parse::<f64>().ok())
                .map(|r| (r.to_degrees() * 1e6).round() / 1e6)
        }
    };
    value.filter(|v| !v.is_nan())
}

pub fn resolve_range(raw_min: &str, raw_max: &str, format: AngleFormat) -> AngleRange {
    let min = parse_bound(raw_min, format).unwrap_or(0.0).clamp(0.0, 360.0);
    let max = parse_bound(raw_max, format).unwrap_or(360.0).clamp(0.0, 360.0);
    if min > max {
        AngleRange { min: max, max: min }
    } else {
        AngleRange { min, max }
    }
}

impl AngleRange {
    /// Canonical angles inside the range, in ascending order.
    ///
    /// When none fall inside, the range collapses onto the canonical angle
    /// closest to `min` (the smaller one on a tie) and that angle is returned.
    pub fn eligible_angles(&mut self) -> Vec<u32> {
        let eligible: Vec<u32> = CANONICAL_ANGLES
            .iter()
            .copied()
            .filter(|&angle| self.min <= f64::from(angle) && f64::from(angle) <= self.max)
            .collect();
        if !eligible.is_empty() {
            return eligible;
        }

        let distance = |angle: u32| (f64::from(angle) - self.min).abs();
        let nearest = CANONICAL_ANGLES
            .iter()
            .copied()
            .fold(CANONICAL_ANGLES[0], |best, angle| {
                if distance(angle) < distance(best) {
                    angle
                } else {
                    best
                }
            });

        log::debug!(
            "Angle range [{}, {}] holds no canonical angle, collapsing to {}°",
            self.min,
            self.max,
            nearest
        );
        self.min = f64::from(nearest);
        self.max = f64::from(nearest);
        vec![nearest]
    }

    /// The bounds as a user would type them in the given units.
    pub fn to_raw(&self, format: AngleFormat) -> (String, String) {
        let render = |degrees: f64| match format {
            AngleFormat::Degrees => degrees.to_string(),
            AngleFormat::Radians => radian_label(degrees),
        };
        (render(self.min), render(self.max))
    }
}
