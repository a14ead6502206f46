//! Migration operations
//!
//! Capturing proposed DDL, classifying it and rendering forward and reverse scripts.

pub mod capture;
pub mod check;
pub mod collection;
pub mod kind;
pub mod operation;

pub use capture::{CapturedStatement, SqlCapture, SqlLogger};
pub use check::{check_migrate, get_migrate_ops, DiffSynchronizer, SchemaSynchronizer};
pub use collection::MigrationOps;
pub use kind::MigrationKind;
pub use operation::{MigrationOp, ReverseSql, RAISE_STATEMENT};
