//! Script writer options

use std::path::PathBuf;

use crate::config::ScriptsConfig;

/// Where scripts live and how they are written
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub scripts_root: PathBuf,
    /// Validate and log, but never write
    pub dry_run: bool,
    /// Ask before each file is written
    pub confirm_write: bool,
    /// Suffix of new scripts when no script exists yet
    pub default_suffix: String,
}

impl ScriptOptions {
    pub fn new(scripts_root: impl Into<PathBuf>) -> Self {
        Self {
            scripts_root: scripts_root.into(),
            dry_run: false,
            confirm_write: false,
            default_suffix: "sql".to_string(),
        }
    }

    pub fn from_config(config: &ScriptsConfig) -> Self {
        Self {
            scripts_root: PathBuf::from(&config.directory),
            dry_run: config.dry_run,
            confirm_write: config.confirm_write,
            default_suffix: config.default_suffix.clone(),
        }
    }
}
