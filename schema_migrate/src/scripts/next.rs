//! Next-script decisions
//!
//! Decides whether the next schema change goes into a new script pair or into
//! the latest pair that has not been applied yet, and writes that pair.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::db::engine::MigrationEngine;
use crate::error::{Error, Result};
use crate::ops::collection::MigrationOps;
use crate::scripts::catalog::ScriptCatalog;
use crate::scripts::filename::{compose, Direction, ScriptFile};
use crate::scripts::naming::ScriptNaming;
use crate::scripts::options::ScriptOptions;

/// Migration state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateState {
    /// No version was ever recorded
    NoneMigrated,
    /// A clean version is recorded
    OnceMigrated(u64),
}

impl MigrateState {
    /// Read the state from the engine; a dirty database is fatal
    pub async fn read(engine: &dyn MigrationEngine) -> Result<Self> {
        match engine.version().await {
            Ok((version, true)) => Err(Error::Dirty { version }),
            Ok((version, false)) => Ok(MigrateState::OnceMigrated(version)),
            Err(Error::NilVersion) => Ok(MigrateState::NoneMigrated),
            Err(e) => Err(e),
        }
    }

    /// Applied version, zero when none
    pub fn version(&self) -> u64 {
        match self {
            MigrateState::NoneMigrated => 0,
            MigrateState::OnceMigrated(version) => *version,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptAction {
    CreateScript,
    UpdateScript,
}

/// The script pair the next schema change belongs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextScriptInfo {
    pub action: ScriptAction,
    pub forward_name: String,
    pub reverse_name: String,
}

/// Decide the next script pair from the engine state and the scripts directory
pub async fn next_script_info(
    engine: &dyn MigrationEngine,
    options: &ScriptOptions,
    naming: &ScriptNaming,
) -> Result<NextScriptInfo> {
    next_script_info_at(engine, options, naming, Local::now()).await
}

/// [`next_script_info`] with an explicit clock reading for time-based naming
pub async fn next_script_info_at(
    engine: &dyn MigrationEngine,
    options: &ScriptOptions,
    naming: &ScriptNaming,
    now: DateTime<Local>,
) -> Result<NextScriptInfo> {
    let state = MigrateState::read(engine).await?;
    let catalog = match ScriptCatalog::from_dir(&options.scripts_root) {
        Ok(catalog) => catalog,
        Err(Error::ScriptsNotFound(path)) => {
            tracing::debug!(path = %path, "Scripts directory does not exist yet");
            ScriptCatalog::new(&options.scripts_root)
        }
        Err(e) => return Err(e),
    };

    let info = decide(state, &catalog, options, naming, now)?;
    tracing::debug!(action = ?info.action, forward = %info.forward_name, reverse = %info.reverse_name, "next script");
    Ok(info)
}

/// Pure decision over an engine state and a catalog
pub fn decide(
    state: MigrateState,
    catalog: &ScriptCatalog,
    options: &ScriptOptions,
    naming: &ScriptNaming,
    now: DateTime<Local>,
) -> Result<NextScriptInfo> {
    let previous = state.version();

    let candidate = match state {
        MigrateState::NoneMigrated => catalog.first(),
        MigrateState::OnceMigrated(version) => catalog.next(version),
    };

    let info = match candidate {
        None => {
            let proposal = previous.checked_add(1).ok_or_else(|| {
                Error::fatal(format!("no version follows database version {}", previous))
            })?;
            let prefix = naming.prefix_at(proposal, now);
            let suffix = catalog
                .first_up_suffix()
                .unwrap_or(options.default_suffix.as_str());

            NextScriptInfo {
                action: ScriptAction::CreateScript,
                forward_name: compose(&prefix, Direction::Up, suffix)?,
                reverse_name: compose(&prefix, Direction::Down, suffix)?,
            }
        }
        Some(version) => {
            if let Some(beyond) = catalog.next(version) {
                return Err(Error::fatal(format!(
                    "script version {} is not the latest: version {} exists beyond it (database version {})",
                    version, beyond, previous
                )));
            }
            if version <= previous {
                return Err(Error::fatal(format!(
                    "script version {} is not above database version {}",
                    version, previous
                )));
            }

            let forward = catalog.up(version).ok_or_else(|| {
                Error::fatal(format!("script version {} has no up script", version))
            })?;
            let reverse = catalog.down(version).ok_or_else(|| {
                Error::fatal(format!("script version {} has no down script", version))
            })?;

            NextScriptInfo {
                action: ScriptAction::UpdateScript,
                forward_name: forward.raw.clone(),
                reverse_name: reverse.raw.clone(),
            }
        }
    };

    check_script_names(&info, previous)?;
    Ok(info)
}

/// Both names parse to one version above the database version
fn check_script_names(info: &NextScriptInfo, previous: u64) -> Result<()> {
    let forward = ScriptFile::parse(&info.forward_name).map_err(|e| Error::fatal(e.to_string()))?;
    let reverse = ScriptFile::parse(&info.reverse_name).map_err(|e| Error::fatal(e.to_string()))?;

    for file in [&forward, &reverse] {
        if file.version <= previous {
            return Err(Error::fatal(format!(
                "{} has version {}, not above database version {}",
                file.raw, file.version, previous
            )));
        }
    }
    if forward.version != reverse.version {
        return Err(Error::fatal(format!(
            "{} and {} have different versions ({} != {})",
            forward.raw, reverse.raw, forward.version, reverse.version
        )));
    }
    Ok(())
}

/// Asks whether a script may be written
pub trait WriteConfirm {
    fn confirm(&self, path: &Path) -> Result<bool>;
}

/// Asks on the terminal; an empty answer means yes
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl WriteConfirm for StdinConfirm {
    fn confirm(&self, path: &Path) -> Result<bool> {
        print!("write script to {}? [Y/n] ", path.display());
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "" | "y" | "yes"
        ))
    }
}

impl NextScriptInfo {
    pub fn forward_path(&self, options: &ScriptOptions) -> PathBuf {
        options.scripts_root.join(&self.forward_name)
    }

    pub fn reverse_path(&self, options: &ScriptOptions) -> PathBuf {
        options.scripts_root.join(&self.reverse_name)
    }

    /// Whether the forward script is already on disk
    pub fn script_exists(&self, options: &ScriptOptions) -> bool {
        self.forward_path(options).is_file()
    }

    /// Write the forward and reverse scripts, asking on stdin when configured to
    pub fn write_scripts(&self, ops: &MigrationOps, options: &ScriptOptions) -> Result<()> {
        self.write_scripts_with(ops, options, &StdinConfirm)
    }

    /// Write the forward and reverse scripts with a custom confirmation
    pub fn write_scripts_with(
        &self,
        ops: &MigrationOps,
        options: &ScriptOptions,
        confirm: &dyn WriteConfirm,
    ) -> Result<()> {
        self.check_target(&options.scripts_root.join(&self.forward_name))?;
        self.check_target(&options.scripts_root.join(&self.reverse_name))?;

        let forward_script = ops.forward_script();
        self.write_script(&self.forward_name, &forward_script, options, confirm)?;

        let (reverse_script, all_reversible) = ops.reverse_script();
        if !all_reversible {
            tracing::warn!(script = %self.reverse_name, "Reverse script has placeholders to complete by hand");
        }
        self.write_script(&self.reverse_name, &reverse_script, options, confirm)
    }

    /// Create must not overwrite and update must not invent a file
    fn check_target(&self, path: &Path) -> Result<()> {
        match self.action {
            ScriptAction::CreateScript if path.exists() => {
                Err(Error::fatal(format!(
                    "cannot create {}: it already exists",
                    path.display()
                )))
            }
            ScriptAction::UpdateScript if !path.is_file() => {
                Err(Error::fatal(format!(
                    "cannot update {}: it does not exist",
                    path.display()
                )))
            }
            _ => Ok(()),
        }
    }

    fn write_script(
        &self,
        name: &str,
        script: &str,
        options: &ScriptOptions,
        confirm: &dyn WriteConfirm,
    ) -> Result<()> {
        let path = options.scripts_root.join(name);
        tracing::debug!(path = %path.display(), script, "script");
        if options.dry_run {
            tracing::info!(path = %path.display(), "Dry run, script not written");
            return Ok(());
        }
        if options.confirm_write && !confirm.confirm(&path)? {
            tracing::info!(path = %path.display(), "Script not written");
            return Ok(());
        }

        fs::create_dir_all(&options.scripts_root)?;
        fs::write(&path, script)?;
        tracing::info!(path = %path.display(), "Script written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::naming::VersionType;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn catalog(versions: &[u64]) -> ScriptCatalog {
        let mut catalog = ScriptCatalog::new("scripts");
        for v in versions {
            for direction in ["up", "down"] {
                let name = format!("{:05}_script.{}.sql", v, direction);
                catalog.append(ScriptFile::parse(&name).unwrap()).unwrap();
            }
        }
        catalog
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()
    }

    fn options() -> ScriptOptions {
        ScriptOptions::new("scripts")
    }

    #[test]
    fn test_create_first_script() {
        let info = decide(
            MigrateState::NoneMigrated,
            &catalog(&[]),
            &options(),
            &ScriptNaming::default(),
            now(),
        )
        .unwrap();

        assert_eq!(
            info,
            NextScriptInfo {
                action: ScriptAction::CreateScript,
                forward_name: "00001_script.up.sql".to_string(),
                reverse_name: "00001_script.down.sql".to_string(),
            }
        );
    }

    #[test]
    fn test_update_unapplied_first_script() {
        let info = decide(
            MigrateState::NoneMigrated,
            &catalog(&[1]),
            &options(),
            &ScriptNaming::default(),
            now(),
        )
        .unwrap();

        assert_eq!(info.action, ScriptAction::UpdateScript);
        assert_eq!(info.forward_name, "00001_script.up.sql");
        assert_eq!(info.reverse_name, "00001_script.down.sql");
    }

    #[test]
    fn test_create_after_latest_applied() {
        let info = decide(
            MigrateState::OnceMigrated(2),
            &catalog(&[1, 2]),
            &options(),
            &ScriptNaming::new(VersionType::Time, "add rank"),
            now(),
        )
        .unwrap();

        assert_eq!(info.action, ScriptAction::CreateScript);
        assert_eq!(info.forward_name, "20240120120000_add_rank.up.sql");
    }

    #[test]
    fn test_update_must_target_latest() {
        let err = decide(
            MigrateState::OnceMigrated(1),
            &catalog(&[1, 2, 3]),
            &options(),
            &ScriptNaming::default(),
            now(),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_suffix_follows_first_up_script() {
        let mut catalog = ScriptCatalog::new("scripts");
        catalog.append(ScriptFile::parse("00001_init.up.psql").unwrap()).unwrap();
        catalog.append(ScriptFile::parse("00001_init.down.psql").unwrap()).unwrap();

        let info = decide(
            MigrateState::OnceMigrated(1),
            &catalog,
            &options(),
            &ScriptNaming::default(),
            now(),
        )
        .unwrap();
        assert_eq!(info.forward_name, "00002_script.up.psql");
        assert_eq!(info.reverse_name, "00002_script.down.psql");
    }

    #[test]
    fn test_update_without_down_script_is_fatal() {
        let mut catalog = ScriptCatalog::new("scripts");
        catalog.append(ScriptFile::parse("00001_init.up.sql").unwrap()).unwrap();

        let err = decide(
            MigrateState::NoneMigrated,
            &catalog,
            &options(),
            &ScriptNaming::default(),
            now(),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_asymmetric_names_are_fatal() {
        let info = NextScriptInfo {
            action: ScriptAction::CreateScript,
            forward_name: "00002_a.up.sql".to_string(),
            reverse_name: "00003_a.down.sql".to_string(),
        };
        assert!(check_script_names(&info, 1).unwrap_err().is_fatal());
        assert!(check_script_names(&info, 2).unwrap_err().is_fatal());
    }
}
