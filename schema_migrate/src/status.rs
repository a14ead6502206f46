//! Migration status
//!
//! Database version, script inventory, pending versions and the schema
//! differences not yet captured in any script.

use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::db::engine::MigrationEngine;
use crate::error::{Error, Result};
use crate::models::ModelRegistry;
use crate::ops::check::{check_migrate, SchemaSynchronizer};
use crate::scripts::catalog::ScriptCatalog;

/// Snapshot of the migration state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub database_version: u64,
    pub is_dirty: bool,
    pub has_migrated: bool,
    pub latest_script_version: u64,
    pub script_count: usize,
    pub pending_count: usize,
    pub up_to_date: bool,
    pub pending_versions: Vec<u64>,
    pub schema_diff_count: usize,
    pub schema_diff_sqls: Vec<String>,
}

/// Inspect the engine, the scripts directory and, when models are given, the schema
pub async fn get_status(
    engine: &dyn MigrationEngine,
    scripts_root: &Path,
    schema_check: Option<(&dyn SchemaSynchronizer, &ModelRegistry)>,
    debug: bool,
) -> Result<MigrationStatus> {
    let mut status = MigrationStatus::default();

    match engine.version().await {
        Ok((version, dirty)) => {
            status.has_migrated = true;
            status.database_version = version;
            status.is_dirty = dirty;
        }
        Err(Error::NilVersion) => {}
        Err(e) => return Err(e),
    }

    let catalog = match ScriptCatalog::from_dir(scripts_root) {
        Ok(catalog) => catalog,
        Err(Error::ScriptsNotFound(_)) => ScriptCatalog::new(scripts_root),
        Err(e) => return Err(e),
    };
    status.script_count = catalog.versions().len();
    status.latest_script_version = catalog.last().unwrap_or(0);

    let applied = status.has_migrated.then_some(status.database_version);
    status.pending_versions = catalog.pending_after(applied);
    status.pending_count = status.pending_versions.len();
    status.up_to_date = status.pending_count == 0;

    if let Some((synchronizer, models)) = schema_check {
        if !models.is_empty() {
            status.schema_diff_sqls = check_migrate(synchronizer, models, debug).await?;
            status.schema_diff_count = status.schema_diff_sqls.len();
        }
    }

    Ok(status)
}

/// Print a status report with colors
pub fn show_status(status: &MigrationStatus) {
    println!("{}", "=== Migration Status ===".cyan());

    if status.has_migrated {
        if status.is_dirty {
            println!(
                "{}",
                format!("Database Version: {} (DIRTY)", status.database_version).red()
            );
        } else {
            println!(
                "{}",
                format!("Database Version: {}", status.database_version).green()
            );
        }
    } else {
        println!("{}", "Database Version: (none - no migration records)".yellow());
    }

    if status.script_count > 0 {
        println!(
            "{}",
            format!(
                "Scripts Latest: {} ({} scripts)",
                status.latest_script_version, status.script_count
            )
            .green()
        );
    } else {
        println!("{}", "Scripts Latest: (none - no scripts found)".yellow());
    }

    if status.pending_count > 0 {
        println!(
            "{}",
            format!("Pending Migrations: {}", status.pending_count).yellow()
        );
        println!("  Versions: {:?}", status.pending_versions);
    } else {
        println!("{}", "Pending Migrations: 0 (up to date)".green());
    }

    if status.schema_diff_count > 0 {
        println!(
            "{}",
            format!("Schema Differences: {}", status.schema_diff_count).yellow()
        );
        println!("  (Database has changes not yet in migration scripts)");
        for (i, sql) in status.schema_diff_sqls.iter().enumerate() {
            println!("-> {} -> {}", i + 1, sql);
        }
    } else {
        println!("{}", "Schema Differences: 0 (Models match database)".green());
    }
}
