use std::fmt;

/// `coefficient·x + constant`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Linear {
    pub coefficient: i64,
    pub constant: i64,
}

impl Linear {
    pub fn new(coefficient: i64, constant: i64) -> Self {
        Self {
            coefficient,
            constant,
        }
    }

    pub fn times(&self, other: &Linear) -> Quadratic {
        Quadratic::new(
            self.coefficient * other.coefficient,
            self.coefficient * other.constant + self.constant * other.coefficient,
            self.constant * other.constant,
        )
    }
}

impl fmt::Display for Linear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_terms(f, &[(self.coefficient, "x"), (self.constant, "")])
    }
}

/// `a·x² + b·x + c`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quadratic {
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl Quadratic {
    pub fn new(a: i64, b: i64, c: i64) -> Self {
        Self { a, b, c }
    }
}

impl fmt::Display for Quadratic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_terms(f, &[(self.a, "x²"), (self.b, "x"), (self.c, "")])
    }
}

/// Writes `±|k|var` terms, dropping zero terms and unit coefficients on variables.
fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[(i64, &str)]) -> fmt::Result {
    let mut first = true;
    for &(coefficient, variable) in terms {
        if coefficient == 0 {
            continue;
        }
        let magnitude = coefficient.unsigned_abs();
        if first {
            if coefficient < 0 {
                write!(f, "-")?;
            }
        } else if coefficient < 0 {
            write!(f, " - ")?;
        } else {
            write!(f, " + ")?;
        }
        if magnitude != 1 || variable.is_empty() {
            write!(f, "{}", magnitude)?;
        }
        write!(f, "{}", variable)?;
        first = false;
    }
    if first {
        write!(f, "0")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_display() {
        assert_eq!(Linear::new(1, 3).to_string(), "x + 3");
        assert_eq!(Linear::new(2, -5).to_string(), "2x - 5");
        assert_eq!(Linear::new(-1, 1).to_string(), "-x + 1");
        assert_eq!(Linear::new(3, 0).to_string(), "3x");
    }

    #[test]
    fn test_quadratic_display_suppresses_zero_and_unit_terms() {
        assert_eq!(Quadratic::new(1, 5, 6).to_string(), "x² + 5x + 6");
        assert_eq!(Quadratic::new(1, 0, -9).to_string(), "x² - 9");
        assert_eq!(Quadratic::new(2, -1, -3).to_string(), "2x² - x - 3");
        assert_eq!(Quadratic::new(0, 0, 0).to_string(), "0");
    }

    #[test]
    fn test_expansion() {
        let product = Linear::new(2, 1).times(&Linear::new(3, -4));
        assert_eq!(product, Quadratic::new(6, -5, -4));
        assert_eq!(
            Linear::new(1, 3).times(&Linear::new(1, -3)),
            Quadratic::new(1, 0, -9)
        );
    }
}
