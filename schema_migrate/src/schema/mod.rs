//! Schema module for schema_migrate
//!
//! This module handles database schema analysis, comparison, and DDL generation.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use diff::SchemaDiff;
pub use generator::MigrationGenerator;
pub use types::{Column, DatabaseSchema, Index, PrimaryKey, Table};
