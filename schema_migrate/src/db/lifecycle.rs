//! Connection and migration engine lifecycle
//!
//! A [`MigrationParam`] only holds factories. Opening it yields a
//! [`MigrationSession`] that builds the connection and the engine on first
//! use and tears them down, engine first, exactly once.

use futures::future::BoxFuture;
use std::future::Future;
use std::path::PathBuf;

use crate::config::Config;
use crate::db::connection::DatabaseConnection;
use crate::db::engine::{MigrationEngine, ScriptMigrator};
use crate::error::{Error, Result};

type ConnectionFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<DatabaseConnection>> + Send + Sync>;

type EngineFactory = Box<
    dyn Fn(DatabaseConnection) -> BoxFuture<'static, Result<Box<dyn MigrationEngine>>>
        + Send
        + Sync,
>;

/// Factories for the database connection and the migration engine
pub struct MigrationParam {
    new_connection: ConnectionFactory,
    new_engine: EngineFactory,
}

impl MigrationParam {
    pub fn new<C, CF, E, EF>(new_connection: C, new_engine: E) -> Self
    where
        C: Fn() -> CF + Send + Sync + 'static,
        CF: Future<Output = Result<DatabaseConnection>> + Send + 'static,
        E: Fn(DatabaseConnection) -> EF + Send + Sync + 'static,
        EF: Future<Output = Result<Box<dyn MigrationEngine>>> + Send + 'static,
    {
        Self {
            new_connection: Box::new(move || Box::pin(new_connection())),
            new_engine: Box::new(move |connection| Box::pin(new_engine(connection))),
        }
    }

    /// Connect with the database settings and run scripts from the scripts directory
    pub fn from_config(config: &Config) -> Self {
        let database = config.database.clone();
        let scripts_root = PathBuf::from(&config.scripts.directory);
        let version_table = config.scripts.version_table.clone();

        Self::new(
            move || {
                let database = database.clone();
                async move { DatabaseConnection::connect(&database).await }
            },
            move |connection| {
                let engine = ScriptMigrator::new(connection, scripts_root.clone(), version_table.clone());
                async move { Ok(Box::new(engine) as Box<dyn MigrationEngine>) }
            },
        )
    }

    /// Open a session; nothing is connected until first use
    pub fn open(self) -> MigrationSession {
        MigrationSession {
            param: self,
            connection: None,
            engine: None,
        }
    }
}

impl std::fmt::Debug for MigrationParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationParam").finish_non_exhaustive()
    }
}

/// Lazily built connection and engine
pub struct MigrationSession {
    param: MigrationParam,
    connection: Option<DatabaseConnection>,
    engine: Option<Box<dyn MigrationEngine>>,
}

impl MigrationSession {
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    async fn ensure_connection(&mut self) -> Result<()> {
        if self.connection.is_none() {
            tracing::debug!("Opening database connection");
            self.connection = Some((self.param.new_connection)().await?);
        }
        Ok(())
    }

    async fn ensure_engine(&mut self) -> Result<()> {
        if self.engine.is_some() {
            return Ok(());
        }
        self.ensure_connection().await?;

        let connection = self
            .connection
            .clone()
            .ok_or_else(|| Error::fatal("connection missing after it was opened"))?;
        tracing::debug!("Opening migration engine");
        self.engine = Some((self.param.new_engine)(connection).await?);
        Ok(())
    }

    /// The cached connection, built on first call
    pub async fn connection(&mut self) -> Result<&DatabaseConnection> {
        self.ensure_connection().await?;
        self.connection
            .as_ref()
            .ok_or_else(|| Error::fatal("connection missing after it was opened"))
    }

    /// The cached engine, built on first call together with the connection it needs
    pub async fn engine(&mut self) -> Result<&dyn MigrationEngine> {
        Ok(self.acquire().await?.0)
    }

    /// Both resources at once
    pub async fn acquire(&mut self) -> Result<(&dyn MigrationEngine, &DatabaseConnection)> {
        self.ensure_engine().await?;
        match (&self.engine, &self.connection) {
            (Some(engine), Some(connection)) => Ok((engine.as_ref(), connection)),
            _ => Err(Error::fatal("migration session resources missing after they were opened")),
        }
    }

    /// Close the engine, then the connection.
    ///
    /// Both are cleared, so closing again does nothing. The connection is
    /// closed even when closing the engine fails; that error is returned.
    pub async fn close(&mut self) -> Result<()> {
        let mut outcome = Ok(());

        if let Some(engine) = self.engine.take() {
            tracing::debug!("Closing migration engine");
            outcome = engine.close().await;
        }
        if let Some(connection) = self.connection.take() {
            tracing::debug!(driver = connection.driver(), "Closing database connection");
            connection.close().await;
        }

        outcome
    }
}
