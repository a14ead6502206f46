//! Migration preview
//!
//! Runs the next forward script inside a transaction that is always rolled back.

use std::fs;
use std::path::Path;

use crate::db::connection::DatabaseConnection;
use crate::db::engine::MigrationEngine;
use crate::error::{Error, Result};
use crate::scripts::naming::ScriptNaming;
use crate::scripts::next::next_script_info;
use crate::scripts::options::ScriptOptions;

/// Result of a successful preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The script holds only whitespace; nothing was executed
    Empty { script: String },
    /// The script executed cleanly and was rolled back
    Success { script: String },
}

/// Preview the script the next migration step would apply
pub async fn preview_next_migration(
    engine: &dyn MigrationEngine,
    connection: &DatabaseConnection,
    scripts_root: &Path,
) -> Result<PreviewOutcome> {
    match engine.version().await {
        Ok((version, true)) => return Err(Error::Dirty { version }),
        Ok(_) | Err(Error::NilVersion) => {}
        Err(e) => return Err(e),
    }

    let options = ScriptOptions::new(scripts_root);
    let info = next_script_info(engine, &options, &ScriptNaming::default()).await?;

    let path = info.forward_path(&options);
    if !path.is_file() {
        return Err(Error::fatal(format!(
            "forward script {} does not exist",
            path.display()
        )));
    }

    let sql = fs::read_to_string(&path)?;
    if sql.trim().is_empty() {
        tracing::info!(script = %info.forward_name, "EMPTY MIGRATION FILE - PREVIEW SUCCESS");
        return Ok(PreviewOutcome::Empty {
            script: info.forward_name,
        });
    }

    tracing::info!("PREVIEWING MIGRATION SCRIPT: {}", info.forward_name);
    if let Err(e) = connection.preview_in_transaction(&sql).await {
        tracing::error!(script = %info.forward_name, error = %e, "PREVIEW FAILED - SQL EXEC ISSUE");
        return Err(e);
    }

    tracing::info!(script = %info.forward_name, "PREVIEW SUCCESS");
    Ok(PreviewOutcome::Success {
        script: info.forward_name,
    })
}
