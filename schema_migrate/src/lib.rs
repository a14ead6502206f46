//! schema_migrate: diff declarative models against a live database and keep
//! versioned up/down migration scripts in step with them.
//!
//! Proposed DDL is captured without being executed, classified into
//! migration operations and written as a forward script plus a reverse
//! placeholder script. The scripts are then applied by a [`MigrationEngine`]
//! that records the current version in a version table.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ops;
pub mod preview;
pub mod schema;
pub mod scripts;
pub mod status;
pub mod utils;

pub use config::Config;
pub use db::{DatabaseConnection, MigrationEngine, MigrationParam, MigrationSession, ScriptMigrator};
pub use error::{Error, Result};
pub use models::{ModelDefinition, ModelRegistry, SchemaModel};
pub use ops::{check_migrate, get_migrate_ops, DiffSynchronizer, MigrationOps, SchemaSynchronizer};
pub use preview::{preview_next_migration, PreviewOutcome};
pub use schema::{MigrationGenerator, SchemaAnalyzer, SchemaDiff};
pub use scripts::{next_script_info, NextScriptInfo, ScriptAction, ScriptNaming, ScriptOptions};
pub use status::{get_status, MigrationStatus};

/// Derive [`SchemaModel`] for a struct
pub use schema_migrate_macros::SchemaModel;
