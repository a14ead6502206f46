//! Utilities for schema_migrate
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{
    apply_naming_convention, format_file_name, format_name, get_index_name, get_table_name,
    quote_identifier,
};
