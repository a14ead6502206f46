//! Classified migration operations

use crate::ops::kind::MigrationKind;

/// Statement that fails on purpose, standing in for reverse SQL nobody wrote yet
pub const RAISE_STATEMENT: &str = "SELECT TODO / PANIC / RAISE / THROW;";

/// Reverse SQL of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseSql {
    /// SQL that undoes the operation
    Reversible(String),
    /// A raising placeholder to be replaced by hand
    NotReversible(String),
}

impl ReverseSql {
    pub fn is_reversible(&self) -> bool {
        matches!(self, ReverseSql::Reversible(_))
    }

    pub fn sql(&self) -> &str {
        match self {
            ReverseSql::Reversible(sql) | ReverseSql::NotReversible(sql) => sql,
        }
    }
}

/// A forward DDL statement and its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOp {
    forward_sql: String,
    kind: MigrationKind,
}

impl MigrationOp {
    /// Classify a statement; statements outside the known kinds yield `None`
    pub fn classify(forward_sql: &str) -> Option<Self> {
        MigrationKind::matching(forward_sql).map(|kind| Self {
            forward_sql: forward_sql.to_string(),
            kind,
        })
    }

    pub fn forward_sql(&self) -> &str {
        &self.forward_sql
    }

    pub fn kind(&self) -> MigrationKind {
        self.kind
    }

    /// Reverse SQL of this operation.
    ///
    /// No reverse SQL is derived; every operation yields a raising placeholder
    /// naming the statement kind that would undo it.
    pub fn reverse_sql(&self) -> ReverseSql {
        ReverseSql::NotReversible(format!(
            "{} -- {}",
            RAISE_STATEMENT,
            self.kind.reverse_substr()
        ))
    }
}
