//! Database connection handling
//!
//! This module provides functionality to establish and manage database connections.

use std::time::Duration;

use sqlx::{
    mysql::MySqlPoolOptions, postgres::PgPoolOptions, sqlite::SqlitePoolOptions, Executor, MySql,
    Pool, Postgres, Sqlite,
};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Enumeration of supported database types
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(10);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        tracing::debug!(driver = %config.driver, pool_size, "Connecting to database");

        match config.driver.as_str() {
            "postgres" => {
                let pool = PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            "mysql" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::MySql(pool))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::Sqlite(pool))
            }
            _ => Err(Error::DatabaseError(format!(
                "Unsupported database driver: {}",
                config.driver
            ))),
        }
    }

    /// Driver name as used in configuration
    pub fn driver(&self) -> &'static str {
        match self {
            DatabaseConnection::Postgres(_) => "postgres",
            DatabaseConnection::MySql(_) => "mysql",
            DatabaseConnection::Sqlite(_) => "sqlite",
        }
    }

    /// Execute SQL text; it may hold several statements
    pub async fn execute(&self, sql: &str) -> Result<()> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                pool.execute(sql).await?;
            }
            DatabaseConnection::MySql(pool) => {
                pool.execute(sql).await?;
            }
            DatabaseConnection::Sqlite(pool) => {
                pool.execute(sql).await?;
            }
        }
        Ok(())
    }

    /// Execute SQL text inside a transaction that is always rolled back.
    ///
    /// The execution error, if any, is returned only after the rollback was issued.
    pub async fn preview_in_transaction(&self, sql: &str) -> Result<()> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                let outcome = (&mut *tx).execute(sql).await.map(|_| ());
                finish_preview(outcome, tx.rollback().await)
            }
            DatabaseConnection::MySql(pool) => {
                let mut tx = pool.begin().await?;
                let outcome = (&mut *tx).execute(sql).await.map(|_| ());
                finish_preview(outcome, tx.rollback().await)
            }
            DatabaseConnection::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let outcome = (&mut *tx).execute(sql).await.map(|_| ());
                finish_preview(outcome, tx.rollback().await)
            }
        }
    }

    /// Replace the content of a version table with at most one row, atomically
    pub async fn replace_version_row(&self, table: &str, row: Option<(i64, bool)>) -> Result<()> {
        let delete = format!("DELETE FROM {}", table);
        let insert = row.map(|(version, dirty)| {
            format!(
                "INSERT INTO {} (version, dirty) VALUES ({}, {})",
                table,
                version,
                if dirty { "TRUE" } else { "FALSE" }
            )
        });

        match self {
            DatabaseConnection::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                (&mut *tx).execute(delete.as_str()).await?;
                if let Some(insert) = &insert {
                    (&mut *tx).execute(insert.as_str()).await?;
                }
                tx.commit().await?;
            }
            DatabaseConnection::MySql(pool) => {
                let mut tx = pool.begin().await?;
                (&mut *tx).execute(delete.as_str()).await?;
                if let Some(insert) = &insert {
                    (&mut *tx).execute(insert.as_str()).await?;
                }
                tx.commit().await?;
            }
            DatabaseConnection::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                (&mut *tx).execute(delete.as_str()).await?;
                if let Some(insert) = &insert {
                    (&mut *tx).execute(insert.as_str()).await?;
                }
                tx.commit().await?;
            }
        }
        Ok(())
    }

    /// Read the single `(version, dirty)` row of a version table
    pub async fn fetch_version_row(&self, table: &str) -> Result<Option<(i64, bool)>> {
        let sql = format!("SELECT version, dirty FROM {} LIMIT 1", table);

        let row = match self {
            DatabaseConnection::Postgres(pool) => {
                sqlx::query_as::<_, (i64, bool)>(&sql).fetch_optional(pool).await?
            }
            DatabaseConnection::MySql(pool) => {
                sqlx::query_as::<_, (i64, bool)>(&sql).fetch_optional(pool).await?
            }
            DatabaseConnection::Sqlite(pool) => {
                sqlx::query_as::<_, (i64, bool)>(&sql).fetch_optional(pool).await?
            }
        };

        Ok(row)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
            DatabaseConnection::Sqlite(pool) => pool.close().await,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            DatabaseConnection::Postgres(pool) => pool.is_closed(),
            DatabaseConnection::MySql(pool) => pool.is_closed(),
            DatabaseConnection::Sqlite(pool) => pool.is_closed(),
        }
    }
}

/// Combine the outcome of a previewed script with the outcome of its rollback.
///
/// The script error wins; a failed rollback is logged and appended to it.
fn finish_preview(
    outcome: std::result::Result<(), sqlx::Error>,
    rollback: std::result::Result<(), sqlx::Error>,
) -> Result<()> {
    match (outcome, rollback) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) => Err(Error::MigrationError(format!("PREVIEW FAILED: {}", e))),
        (Err(e), Err(rollback_error)) => {
            tracing::error!(error = %rollback_error, "Rollback after a failed preview failed");
            Err(Error::MigrationError(format!(
                "PREVIEW FAILED: {}; rollback failed: {}",
                e, rollback_error
            )))
        }
        (Ok(()), Err(rollback_error)) => {
            tracing::error!(error = %rollback_error, "Rollback after a clean preview failed");
            Err(Error::SqlxError(rollback_error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_survives_failed_rollback() {
        let err = finish_preview(Err(sqlx::Error::RowNotFound), Err(sqlx::Error::PoolClosed))
            .unwrap_err();

        match err {
            Error::MigrationError(message) => {
                assert!(message.starts_with("PREVIEW FAILED"));
                assert!(message.contains(&sqlx::Error::RowNotFound.to_string()));
                assert!(message.contains(&sqlx::Error::PoolClosed.to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rollback_outcomes() {
        assert!(finish_preview(Ok(()), Ok(())).is_ok());
        assert!(matches!(
            finish_preview(Err(sqlx::Error::RowNotFound), Ok(())),
            Err(Error::MigrationError(_))
        ));
        assert!(matches!(
            finish_preview(Ok(()), Err(sqlx::Error::PoolClosed)),
            Err(Error::SqlxError(sqlx::Error::PoolClosed))
        ));
    }
}
