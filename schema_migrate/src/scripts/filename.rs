//! Migration script file names
//!
//! Scripts are named `{version}_{description}.{up|down}.{suffix}`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};

static SCRIPT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)_(.*)\.(down|up)\.(.*)$").expect("script name pattern is valid")
});

static SCRIPT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)_(.*)$").expect("script prefix pattern is valid"));

/// Direction of a script in a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed script file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptFile {
    pub version: u64,
    pub description: String,
    pub direction: Direction,
    pub suffix: String,
    /// The file name exactly as it appears on disk
    pub raw: String,
}

impl ScriptFile {
    /// Parse a file name against the script grammar
    pub fn parse(name: &str) -> Result<Self> {
        let caps = SCRIPT_NAME.captures(name).ok_or_else(|| {
            Error::ValidationError(format!(
                "{} does not match {{version}}_{{description}}.{{up|down}}.{{suffix}}",
                name
            ))
        })?;

        let version = caps[1].parse::<u64>().map_err(|e| {
            Error::ValidationError(format!("Invalid version in {}: {}", name, e))
        })?;
        let direction = match &caps[3] {
            "up" => Direction::Up,
            _ => Direction::Down,
        };

        Ok(Self {
            version,
            description: caps[2].to_string(),
            direction,
            suffix: caps[4].to_string(),
            raw: name.to_string(),
        })
    }

    /// Whether a file name follows the script grammar
    pub fn matches(name: &str) -> bool {
        SCRIPT_NAME.is_match(name)
    }
}

/// Build a script file name from a `{version}_{description}` prefix.
///
/// The prefix and suffix may not contain `.` and the result must parse back.
pub fn compose(prefix: &str, direction: Direction, suffix: &str) -> Result<String> {
    if !SCRIPT_PREFIX.is_match(prefix) || prefix.contains('.') {
        return Err(Error::fatal(format!(
            "script prefix {:?} must look like {{version}}_{{description}} without '.'",
            prefix
        )));
    }
    if suffix.is_empty() || suffix.contains('.') {
        return Err(Error::fatal(format!(
            "script suffix {:?} must be non-empty without '.'",
            suffix
        )));
    }

    let name = format!("{}.{}.{}", prefix, direction, suffix);
    if !ScriptFile::matches(&name) {
        return Err(Error::fatal(format!("{} is not a valid script name", name)));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_up_script() {
        let file = ScriptFile::parse("00007_add_rank.up.sql").unwrap();
        assert_eq!(file.version, 7);
        assert_eq!(file.description, "add_rank");
        assert_eq!(file.direction, Direction::Up);
        assert_eq!(file.suffix, "sql");
        assert_eq!(file.raw, "00007_add_rank.up.sql");
    }

    #[test]
    fn test_parse_timestamp_down_script() {
        let file = ScriptFile::parse("20240120120000_users.down.sql").unwrap();
        assert_eq!(file.version, 20240120120000);
        assert_eq!(file.direction, Direction::Down);
    }

    #[rstest]
    #[case("README.md")]
    #[case("1_init.sideways.sql")]
    #[case("abc_init.up.sql")]
    #[case("99999999999999999999999_overflow.up.sql")]
    fn test_parse_rejects(#[case] name: &str) {
        assert!(ScriptFile::parse(name).is_err());
    }

    #[test]
    fn test_compose() {
        assert_eq!(
            compose("00003_script", Direction::Up, "sql").unwrap(),
            "00003_script.up.sql"
        );
        assert_eq!(
            compose("00003_script", Direction::Down, "sql").unwrap(),
            "00003_script.down.sql"
        );
    }

    #[rstest]
    #[case("script", "sql")]
    #[case("00003_v1.2", "sql")]
    #[case("00003_script", "tar.gz")]
    #[case("00003_script", "")]
    fn test_compose_rejects(#[case] prefix: &str, #[case] suffix: &str) {
        let err = compose(prefix, Direction::Up, suffix).unwrap_err();
        assert!(err.is_fatal());
    }
}
