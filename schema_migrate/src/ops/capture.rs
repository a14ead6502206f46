//! Statement capture
//!
//! [`SqlLogger`] is the hook a schema synchronizer reports to while it runs in
//! dry-run mode. [`SqlCapture`] records every proposed statement in order and
//! executes nothing.

use std::time::Instant;
use tracing::Level;

use crate::error::Error;

/// Receives the messages and statements of a dry-run synchronization pass
pub trait SqlLogger: Send {
    /// Called once before the pass with the verbosity it runs at
    fn log_mode(&mut self, level: Level);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Called once per proposed statement; `statement` yields `(sql, rows_affected)`
    fn trace(
        &mut self,
        begin: Instant,
        statement: &dyn Fn() -> (String, i64),
        error: Option<&Error>,
    );
}

/// A proposed statement and its emission position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedStatement {
    pub sql: String,
    pub index: usize,
}

/// Records proposed statements in emission order
#[derive(Debug, Default)]
pub struct SqlCapture {
    statements: Vec<CapturedStatement>,
    debug: bool,
}

impl SqlCapture {
    pub fn new(debug: bool) -> Self {
        Self {
            statements: Vec::new(),
            debug,
        }
    }

    pub fn statements(&self) -> &[CapturedStatement] {
        &self.statements
    }

    /// The captured SQL text, in emission order
    pub fn sqls(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.sql.clone()).collect()
    }
}

impl SqlLogger for SqlCapture {
    fn log_mode(&mut self, level: Level) {
        if self.debug {
            tracing::debug!(%level, "mode");
        }
    }

    fn info(&self, message: &str) {
        if self.debug {
            tracing::info!("info {}", message);
        }
    }

    fn warn(&self, message: &str) {
        if self.debug {
            tracing::warn!("warn {}", message);
        }
    }

    fn error(&self, message: &str) {
        if self.debug {
            tracing::error!("error {}", message);
        }
    }

    fn trace(
        &mut self,
        begin: Instant,
        statement: &dyn Fn() -> (String, i64),
        _error: Option<&Error>,
    ) {
        let (sql, _) = statement();
        if self.debug {
            tracing::debug!(elapsed = ?begin.elapsed(), "SQL>>> {} <<<END", sql);
        }

        let index = self.statements.len();
        self.statements.push(CapturedStatement { sql, index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_records_in_order() {
        let mut capture = SqlCapture::new(false);
        capture.log_mode(Level::INFO);
        capture.info("ignored");

        for sql in ["CREATE TABLE `a` (`id` INTEGER)", "CREATE INDEX `i` ON `a`(`id`)"] {
            capture.trace(Instant::now(), &|| (sql.to_string(), 0), None);
        }

        let statements = capture.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].index, 0);
        assert_eq!(statements[1].index, 1);
        assert_eq!(statements[1].sql, "CREATE INDEX `i` ON `a`(`id`)");
    }
}
