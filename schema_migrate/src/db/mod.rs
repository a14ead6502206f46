//! Database module for schema_migrate
//!
//! Connections, the migration engine and their lifecycle.

pub mod connection;
pub mod engine;
pub mod lifecycle;

// Re-export key types
pub use connection::DatabaseConnection;
pub use engine::{MigrationEngine, ScriptMigrator};
pub use lifecycle::{MigrationParam, MigrationSession};
