//! Models module for schema_migrate
//!
//! This module holds declarative model definitions and the registry that turns
//! them into a target database schema.

pub mod definition;
pub mod registry;

// Re-export key types
pub use definition::{FieldDefinition, IndexSpec, ModelDefinition, SchemaModel};
pub use registry::ModelRegistry;
