//! Script naming strategies

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::naming::format_file_name;

/// How the version part of a new script name is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionType {
    /// Zero-padded incrementing number, e.g. `00007`
    Next,
    /// Current Unix timestamp in seconds
    Unix,
    /// Current local time as `YYYYMMDDHHMMSS`
    Time,
}

impl FromStr for VersionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NEXT" => Ok(VersionType::Next),
            "UNIX" => Ok(VersionType::Unix),
            "TIME" => Ok(VersionType::Time),
            other => Err(Error::ValidationError(format!(
                "Unknown version type {:?}, expected NEXT, UNIX or TIME",
                other
            ))),
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionType::Next => "NEXT",
            VersionType::Unix => "UNIX",
            VersionType::Time => "TIME",
        };
        f.write_str(name)
    }
}

/// Naming of newly created scripts: `{version}_{description}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptNaming {
    pub version_type: VersionType,
    pub description: String,
}

impl Default for ScriptNaming {
    fn default() -> Self {
        Self {
            version_type: VersionType::Next,
            description: "script".to_string(),
        }
    }
}

impl ScriptNaming {
    pub fn new(version_type: VersionType, description: impl Into<String>) -> Self {
        Self {
            version_type,
            description: description.into(),
        }
    }

    /// Prefix for a new script at the proposed `version`, using the current time
    pub fn new_script_prefix(&self, version: u64) -> String {
        self.prefix_at(version, Local::now())
    }

    /// Prefix for a new script at the proposed `version` with an explicit clock reading.
    ///
    /// `Next` uses the proposed version; `Unix` and `Time` ignore it.
    pub fn prefix_at(&self, version: u64, now: DateTime<Local>) -> String {
        let version = match self.version_type {
            VersionType::Next => format!("{:05}", version),
            VersionType::Unix => now.timestamp().to_string(),
            VersionType::Time => now.format("%Y%m%d%H%M%S").to_string(),
        };
        format!("{}_{}", version, format_file_name(&self.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 20, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_next_is_idempotent() {
        let naming = ScriptNaming::default();
        assert_eq!(naming.new_script_prefix(7), "00007_script");
        assert_eq!(naming.new_script_prefix(7), naming.new_script_prefix(7));
        assert_eq!(naming.new_script_prefix(123456), "123456_script");
    }

    #[test]
    fn test_time_and_unix_use_clock() {
        let now = fixed_clock();

        let time = ScriptNaming::new(VersionType::Time, "add users");
        assert_eq!(time.prefix_at(3, now), "20240120123005_add_users");

        let unix = ScriptNaming::new(VersionType::Unix, "add users");
        assert_eq!(unix.prefix_at(3, now), format!("{}_add_users", now.timestamp()));
    }

    #[rstest]
    #[case("NEXT", VersionType::Next)]
    #[case("unix", VersionType::Unix)]
    #[case("Time", VersionType::Time)]
    fn test_parse_version_type(#[case] input: &str, #[case] expected: VersionType) {
        assert_eq!(input.parse::<VersionType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_version_type() {
        assert!("DATE".parse::<VersionType>().is_err());
    }
}
