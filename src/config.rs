use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "db.sqlite";
const DEFAULT_AUTO_ADVANCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: String,
    /// Pause between a correct answer and the next question.
    pub auto_advance: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path =
            lookup("DRILL_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let auto_advance_ms = parse_or(&lookup, "DRILL_AUTO_ADVANCE_MS", DEFAULT_AUTO_ADVANCE_MS);

        Self {
            database_path,
            auto_advance: Duration::from_millis(auto_advance_ms),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{}={:?} is not valid, using {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]);
        assert_eq!(settings.database_path, "db.sqlite");
        assert_eq!(settings.auto_advance, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("DRILL_DB_PATH", "/var/lib/drill.sqlite"),
            ("DRILL_AUTO_ADVANCE_MS", " 1200 "),
        ]);
        assert_eq!(settings.database_path, "/var/lib/drill.sqlite");
        assert_eq!(settings.auto_advance, Duration::from_millis(1200));
    }

    #[test]
    fn test_invalid_delay_falls_back_to_default() {
        let settings = settings(&[("DRILL_AUTO_ADVANCE_MS", "soon")]);
        assert_eq!(settings.auto_advance, Duration::from_millis(500));
    }
}
