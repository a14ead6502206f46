#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use schema_migrate::config::{
    Config, DatabaseConfig, SchemaConfig, ScriptsConfig, TypeMappingConfig,
};
use schema_migrate::{DatabaseConnection, Error, MigrationEngine, Result};

/// Configuration for a file-backed SQLite database inside `dir`
pub fn sqlite_config(dir: &Path) -> Config {
    Config {
        debug: false,
        database: DatabaseConfig {
            driver: "sqlite".to_string(),
            url: format!("sqlite://{}?mode=rwc", dir.join("app.db").display()),
            pool_size: Some(1),
            timeout_seconds: Some(5),
            schema: None,
        },
        scripts: ScriptsConfig {
            directory: dir.join("scripts").to_string_lossy().into_owned(),
            default_suffix: "sql".to_string(),
            dry_run: false,
            confirm_write: false,
            version_table: "schema_migrations".to_string(),
            description: "script".to_string(),
        },
        schema: SchemaConfig {
            default_nullable: true,
            ..SchemaConfig::default()
        },
        type_mapping: TypeMappingConfig::default(),
        models: None,
        logging: None,
    }
}

pub async fn connect(config: &Config) -> DatabaseConnection {
    DatabaseConnection::connect(&config.database)
        .await
        .expect("sqlite connection")
}

pub fn write_script(root: &Path, name: &str, content: &str) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join(name), content).unwrap();
}

/// Engine with a fixed version that records how it was closed
#[derive(Debug, Clone)]
pub struct FakeEngine {
    /// `None` reports a nil version
    pub version: Option<(u64, bool)>,
    pub closed: Arc<AtomicBool>,
    /// Connection state seen when the engine was closed
    pub connection_open_at_close: Arc<Mutex<Option<bool>>>,
    pub connection: Option<DatabaseConnection>,
}

impl FakeEngine {
    pub fn at(version: Option<(u64, bool)>) -> Self {
        Self {
            version,
            closed: Arc::new(AtomicBool::new(false)),
            connection_open_at_close: Arc::new(Mutex::new(None)),
            connection: None,
        }
    }

    pub fn watching(connection: DatabaseConnection) -> Self {
        Self {
            connection: Some(connection),
            ..Self::at(None)
        }
    }
}

#[async_trait]
impl MigrationEngine for FakeEngine {
    async fn version(&self) -> Result<(u64, bool)> {
        self.version.ok_or(Error::NilVersion)
    }

    async fn steps(&self, _n: i64) -> Result<()> {
        Err(Error::NoChange)
    }

    async fn up(&self) -> Result<()> {
        Err(Error::NoChange)
    }

    async fn close(&self) -> Result<()> {
        if let Some(connection) = &self.connection {
            *self.connection_open_at_close.lock().unwrap() = Some(!connection.is_closed());
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
