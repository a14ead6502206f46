//! Migration checks
//!
//! Runs a schema synchronizer in dry-run mode, captures what it proposes and
//! keeps the statements that classify as migration operations.

use async_trait::async_trait;
use std::time::Instant;
use tracing::Level;

use crate::config::Config;
use crate::db::connection::DatabaseConnection;
use crate::error::Result;
use crate::models::ModelRegistry;
use crate::ops::capture::{SqlCapture, SqlLogger};
use crate::ops::collection::MigrationOps;
use crate::ops::operation::MigrationOp;
use crate::schema::{MigrationGenerator, SchemaAnalyzer, SchemaDiff};

/// Proposes the DDL that would reconcile a model set with the database
#[async_trait]
pub trait SchemaSynchronizer: Send + Sync {
    /// Report every proposed statement to `sink` without executing it
    async fn dry_run(&self, models: &ModelRegistry, sink: &mut dyn SqlLogger) -> Result<()>;
}

/// Synchronizer that introspects the database and diffs it against the models
#[derive(Debug, Clone)]
pub struct DiffSynchronizer {
    connection: DatabaseConnection,
    config: Config,
}

impl DiffSynchronizer {
    pub fn new(connection: DatabaseConnection, config: Config) -> Self {
        Self { connection, config }
    }

    async fn propose(&self, models: &ModelRegistry) -> Result<Vec<String>> {
        let analyzer = SchemaAnalyzer::new(self.connection.clone(), self.config.database.schema.clone());
        let current = analyzer.analyze().await?;
        let target = models.to_database_schema(&self.config)?;

        let diff = SchemaDiff::generate(&current, &target);
        let generator = MigrationGenerator::new(self.connection.driver())?;
        Ok(generator.generate_migration_sql(&diff))
    }
}

#[async_trait]
impl SchemaSynchronizer for DiffSynchronizer {
    async fn dry_run(&self, models: &ModelRegistry, sink: &mut dyn SqlLogger) -> Result<()> {
        sink.log_mode(if self.config.debug { Level::DEBUG } else { Level::INFO });

        let statements = match self.propose(models).await {
            Ok(statements) => statements,
            Err(e) => {
                sink.error(&e.to_string());
                return Err(e);
            }
        };

        sink.info(&format!("{} statements proposed", statements.len()));
        for sql in statements {
            let begin = Instant::now();
            sink.trace(begin, &|| (sql.clone(), 0), None);
        }
        Ok(())
    }
}

/// Dry-run the synchronizer and classify what it proposes, in proposal order
pub async fn get_migrate_ops(
    synchronizer: &dyn SchemaSynchronizer,
    models: &ModelRegistry,
    debug: bool,
) -> Result<MigrationOps> {
    let mut capture = SqlCapture::new(debug);
    synchronizer.dry_run(models, &mut capture).await?;

    if debug {
        tracing::debug!(statements = ?capture.sqls(), "execute");
    }

    Ok(capture
        .statements()
        .iter()
        .filter_map(|statement| MigrationOp::classify(&statement.sql))
        .collect())
}

/// Forward SQL of every pending operation; empty when the models match the database
pub async fn check_migrate(
    synchronizer: &dyn SchemaSynchronizer,
    models: &ModelRegistry,
    debug: bool,
) -> Result<Vec<String>> {
    let ops = get_migrate_ops(synchronizer, models, debug).await?;
    tracing::debug!(size = ops.len(), "missing");

    let sqls = ops.forward_sqls();
    for (idx, sql) in sqls.iter().enumerate() {
        tracing::debug!("missing: ({}/{})\n\n{};\n", idx, sqls.len(), sql);
    }
    if !sqls.is_empty() {
        tracing::debug!("scripts:\n\n{};\n", sqls.join(";\n\n"));
    }
    Ok(sqls)
}
