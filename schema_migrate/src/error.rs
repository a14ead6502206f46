//! Error types for schema_migrate

use thiserror::Error;

/// Result type for schema_migrate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_migrate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Model registration error: {0}")]
    ModelRegistrationError(String),

    #[error("Type mapping error: {0}")]
    TypeMappingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An operator or programming error that must stop the current command.
    #[error("Fatal invariant violation: {0}")]
    FatalInvariantViolation(String),

    #[error("Database is dirty at version {version}")]
    Dirty { version: u64 },

    /// The version table holds no version yet.
    #[error("No version recorded in the version table")]
    NilVersion,

    /// There was nothing to migrate.
    #[error("No migration was necessary")]
    NoChange,

    #[error("Migration scripts not found: {0}")]
    ScriptsNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl Error {
    /// Shorthand for a [`Error::FatalInvariantViolation`].
    pub fn fatal(message: impl Into<String>) -> Self {
        Error::FatalInvariantViolation(message.into())
    }

    /// Errors that abort the command and must never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::FatalInvariantViolation(_) | Error::Dirty { .. })
    }

    /// Sentinel errors meaning "nothing to do", reported but not failed on.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(
            self,
            Error::NilVersion | Error::NoChange | Error::ScriptsNotFound(_)
        )
    }
}

/// Log nothing-to-do sentinels and swallow them; pass every other outcome through.
pub fn settle(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => {
            tracing::debug!("MIGRATION SUCCESS");
            Ok(())
        }
        Err(Error::NoChange) => {
            tracing::info!("NO MIGRATION FILES TO RUN");
            Ok(())
        }
        Err(Error::NilVersion) => {
            tracing::info!("NO VERSION IN VERSION TABLE");
            Ok(())
        }
        Err(Error::ScriptsNotFound(path)) => {
            tracing::info!(path = %path, "MIGRATION FILES NOT FOUND");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Convert Serde JSON errors to schema_migrate errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert YAML errors to schema_migrate errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_migrate errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::fatal("asymmetric names").is_fatal());
        assert!(Error::Dirty { version: 3 }.is_fatal());
        assert!(!Error::NoChange.is_fatal());

        assert!(Error::NoChange.is_nothing_to_do());
        assert!(Error::NilVersion.is_nothing_to_do());
        assert!(Error::ScriptsNotFound("scripts".to_string()).is_nothing_to_do());
        assert!(!Error::MigrationError("boom".to_string()).is_nothing_to_do());
    }

    #[test]
    fn test_settle() {
        assert!(settle(Ok(())).is_ok());
        assert!(settle(Err(Error::NoChange)).is_ok());
        assert!(settle(Err(Error::NilVersion)).is_ok());

        let err = settle(Err(Error::Dirty { version: 7 })).unwrap_err();
        assert!(matches!(err, Error::Dirty { version: 7 }));
    }
}
