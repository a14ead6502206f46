//! Ordered operation collections and script rendering

use crate::ops::operation::{MigrationOp, ReverseSql};

/// Operations in the order the synchronizer proposed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOps(Vec<MigrationOp>);

impl MigrationOps {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, op: MigrationOp) {
        self.0.push(op);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationOp> {
        self.0.iter()
    }

    /// First operation whose forward SQL equals `forward_sql`, ignoring case
    pub fn search_op(&self, forward_sql: &str) -> Option<&MigrationOp> {
        self.0.iter().find(|op| {
            op.forward_sql().to_lowercase() == forward_sql.to_lowercase()
        })
    }

    pub fn forward_sqls(&self) -> Vec<String> {
        self.0.iter().map(|op| op.forward_sql().to_string()).collect()
    }

    /// Every forward statement terminated by `;`, separated by blank lines
    pub fn forward_script(&self) -> String {
        let statements: Vec<String> = self
            .0
            .iter()
            .map(|op| format!("{};", op.forward_sql()))
            .collect();
        join_script(statements)
    }

    /// Reverse statements, last operation first.
    ///
    /// The flag is true only when every operation supplied real reverse SQL.
    /// Placeholders are preceded by a comment carrying the forward statement.
    pub fn reverse_script(&self) -> (String, bool) {
        let mut all_reversible = true;
        let mut statements = Vec::with_capacity(self.0.len());

        for op in self.0.iter().rev() {
            match op.reverse_sql() {
                ReverseSql::Reversible(sql) => statements.push(format!("{};", sql)),
                ReverseSql::NotReversible(placeholder) => {
                    all_reversible = false;
                    statements.push(format!(
                        "-- reverse -- {};\n{}; -- TODO",
                        op.forward_sql(),
                        placeholder
                    ));
                }
            }
        }

        (join_script(statements), all_reversible)
    }
}

fn join_script(statements: Vec<String>) -> String {
    let mut script = statements.join("\n\n");
    if !script.is_empty() {
        script.push('\n');
    }
    script
}

impl FromIterator<MigrationOp> for MigrationOps {
    fn from_iter<I: IntoIterator<Item = MigrationOp>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MigrationOps {
    type Item = MigrationOp;
    type IntoIter = std::vec::IntoIter<MigrationOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MigrationOps {
    type Item = &'a MigrationOp;
    type IntoIter = std::slice::Iter<'a, MigrationOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
