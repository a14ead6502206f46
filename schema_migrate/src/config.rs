//! Configuration handling for schema_migrate

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::ModelDefinition;

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete schema_migrate configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Mirror captured statements and sink callbacks to the debug log
    #[serde(default)]
    pub debug: bool,
    pub database: DatabaseConfig,
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub type_mapping: TypeMappingConfig,
    pub models: Option<ModelsConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub schema: Option<String>,
}

/// Migration script directory and writer settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScriptsConfig {
    pub directory: String,
    #[serde(default = "default_suffix")]
    pub default_suffix: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub confirm_write: bool,
    #[serde(default = "default_version_table")]
    pub version_table: String,
    #[serde(default = "default_description")]
    pub description: String,
}

/// How model definitions become tables, columns and indexes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchemaConfig {
    #[serde(default)]
    pub default_nullable: bool,
    #[serde(default = "default_index_pattern")]
    pub index_pattern: String,
    #[serde(default = "default_table_style")]
    pub table_style: String,
    #[serde(default = "default_true")]
    pub pluralize_tables: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_nullable: false,
            index_pattern: default_index_pattern(),
            table_style: default_table_style(),
            pluralize_tables: true,
        }
    }
}

/// Type mapping configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TypeMappingConfig {
    pub custom: Option<Vec<CustomTypeMapping>>,
}

/// Custom type mapping
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomTypeMapping {
    pub rust_type: String,
    pub db_type: String,
}

/// Where declarative model definitions live
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelsConfig {
    pub definitions: String,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub stdout: bool,
}

/// Load model definitions from a YAML or TOML file
pub fn load_models(path: &str) -> Result<Vec<ModelDefinition>> {
    #[derive(Deserialize)]
    struct ModelsFile {
        models: Vec<ModelDefinition>,
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read models file {}: {}", path, e)))?;

    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let file: ModelsFile = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => {
            return Err(Error::ConfigError(format!(
                "Unsupported models file extension: {:?}",
                other
            )))
        }
    };

    Ok(file.models)
}

fn default_suffix() -> String {
    "sql".to_string()
}

fn default_version_table() -> String {
    "schema_migrations".to_string()
}

fn default_description() -> String {
    "script".to_string()
}

fn default_index_pattern() -> String {
    "idx_{table}_{columns}".to_string()
}

fn default_table_style() -> String {
    "snake_case".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            driver = "sqlite"
            url = "sqlite://app.db"

            [scripts]
            directory = "./scripts"
            "#,
        )
        .unwrap();

        assert!(!config.debug);
        assert_eq!(config.scripts.default_suffix, "sql");
        assert_eq!(config.scripts.version_table, "schema_migrations");
        assert_eq!(config.scripts.description, "script");
        assert_eq!(config.schema.index_pattern, "idx_{table}_{columns}");
        assert!(config.schema.pluralize_tables);
        assert!(config.models.is_none());
    }

    #[test]
    fn test_load_models_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
models:
  - name: User
    table_name: users
    fields:
      - name: id
        rust_type: u32
        primary_key: true
      - name: code
        rust_type: String
        unique: true
"#
        )
        .unwrap();

        let models = load_models(file.path().to_str().unwrap()).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].table_name.as_deref(), Some("users"));
        assert_eq!(models[0].fields.len(), 2);
        assert!(models[0].fields[1].unique);
    }

    #[test]
    fn test_load_models_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let err = load_models(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
