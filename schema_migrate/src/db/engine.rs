//! Migration engine
//!
//! This module applies versioned script pairs against the database and tracks
//! the applied version together with a dirty flag in a one-row version table.

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::scripts::catalog::ScriptCatalog;

/// Applies script pairs and reports the applied version
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Current `(version, dirty)`; [`Error::NilVersion`] when nothing was ever applied
    async fn version(&self) -> Result<(u64, bool)>;

    /// Apply `n` pending scripts, or roll back `-n` applied ones when negative
    async fn steps(&self, n: i64) -> Result<()>;

    /// Apply every pending script; [`Error::NoChange`] when none is pending
    async fn up(&self) -> Result<()>;

    /// Release the engine; later calls fail
    async fn close(&self) -> Result<()>;
}

/// Engine that runs `.up`/`.down` scripts from a scripts directory
#[derive(Debug)]
pub struct ScriptMigrator {
    connection: DatabaseConnection,
    scripts_root: PathBuf,
    version_table: String,
    closed: AtomicBool,
}

impl ScriptMigrator {
    pub fn new(
        connection: DatabaseConnection,
        scripts_root: impl Into<PathBuf>,
        version_table: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            scripts_root: scripts_root.into(),
            version_table: version_table.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create the version table if it doesn't exist
    async fn ensure_version_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (version BIGINT NOT NULL PRIMARY KEY, dirty BOOLEAN NOT NULL)",
            self.version_table
        );
        self.connection.execute(&sql).await
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::MigrationError("migration engine is closed".to_string()));
        }
        Ok(())
    }

    /// Applied version, `None` when nothing was ever applied; fails when dirty
    async fn clean_version(&self) -> Result<Option<u64>> {
        match self.version().await {
            Ok((version, true)) => Err(Error::Dirty { version }),
            Ok((version, false)) => Ok(Some(version)),
            Err(Error::NilVersion) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the version row; the version is checked before anything is deleted
    async fn set_version(&self, version: Option<u64>, dirty: bool) -> Result<()> {
        let row = match version {
            Some(version) => {
                let version = i64::try_from(version).map_err(|_| {
                    Error::MigrationError(format!(
                        "version {} does not fit the version table",
                        version
                    ))
                })?;
                Some((version, dirty))
            }
            None => None,
        };

        self.connection
            .replace_version_row(&self.version_table, row)
            .await
    }

    fn catalog(&self) -> Result<ScriptCatalog> {
        ScriptCatalog::from_dir(&self.scripts_root)
    }

    async fn run_script(&self, catalog: &ScriptCatalog, path: PathBuf) -> Result<()> {
        let script = fs::read_to_string(&path)?;
        if script.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Script is empty, nothing to execute");
            return Ok(());
        }

        tracing::debug!(path = %path.display(), root = %catalog.root().display(), "Executing script");
        self.connection.execute(&script).await
    }

    async fn apply_up(&self, catalog: &ScriptCatalog, version: u64) -> Result<()> {
        let file = catalog.up(version).ok_or_else(|| {
            Error::MigrationError(format!("no up script for version {}", version))
        })?;

        tracing::info!(version, script = %file.raw, "Applying migration");
        self.set_version(Some(version), true).await?;
        self.run_script(catalog, catalog.path_of(file)).await?;
        self.set_version(Some(version), false).await?;
        tracing::info!(version, "Migration applied successfully");
        Ok(())
    }

    async fn apply_down(&self, catalog: &ScriptCatalog, version: u64) -> Result<Option<u64>> {
        let file = catalog.down(version).ok_or_else(|| {
            Error::MigrationError(format!("no down script for version {}", version))
        })?;
        let target = catalog.prev(version);

        tracing::info!(version, script = %file.raw, "Rolling back migration");
        self.set_version(Some(version), true).await?;
        self.run_script(catalog, catalog.path_of(file)).await?;
        self.set_version(target, false).await?;
        tracing::info!(version, target = ?target, "Migration rolled back successfully");
        Ok(target)
    }
}

#[async_trait]
impl MigrationEngine for ScriptMigrator {
    async fn version(&self) -> Result<(u64, bool)> {
        self.check_open()?;
        self.ensure_version_table().await?;

        match self.connection.fetch_version_row(&self.version_table).await? {
            Some((version, dirty)) if version >= 0 => Ok((version as u64, dirty)),
            _ => Err(Error::NilVersion),
        }
    }

    async fn steps(&self, n: i64) -> Result<()> {
        self.check_open()?;
        if n == 0 {
            return Err(Error::NoChange);
        }

        let current = self.clean_version().await?;
        let catalog = self.catalog()?;
        let count = n.unsigned_abs() as usize;

        if n > 0 {
            let pending = catalog.pending_after(current);
            if pending.is_empty() {
                return Err(Error::NoChange);
            }
            if pending.len() < count {
                return Err(Error::MigrationError(format!(
                    "requested {} steps up but only {} scripts are pending",
                    count,
                    pending.len()
                )));
            }
            for version in pending.into_iter().take(count) {
                self.apply_up(&catalog, version).await?;
            }
            return Ok(());
        }

        let mut version = current.ok_or(Error::NilVersion)?;
        let applied = catalog.versions().into_iter().filter(|v| *v <= version).count();
        if applied < count {
            return Err(Error::MigrationError(format!(
                "requested {} steps down but only {} scripts are applied",
                count, applied
            )));
        }
        for step in 0..count {
            match self.apply_down(&catalog, version).await? {
                Some(prev) => version = prev,
                None if step + 1 == count => break,
                None => return Err(Error::NilVersion),
            }
        }
        Ok(())
    }

    async fn up(&self) -> Result<()> {
        self.check_open()?;

        let current = self.clean_version().await?;
        let catalog = self.catalog()?;
        let pending = catalog.pending_after(current);
        if pending.is_empty() {
            return Err(Error::NoChange);
        }

        for version in pending {
            self.apply_up(&catalog, version).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(table = %self.version_table, "Migration engine closed");
        }
        Ok(())
    }
}
