//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(planera::io))]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(planera::config))]
    Config(String),

    /// Entity declaration error.
    #[error("Schema error: {0}")]
    #[diagnostic(code(planera::schema))]
    Schema(#[from] planera_schema::SchemaError),

    /// Database error.
    #[error("Database error: {0}")]
    #[diagnostic(code(planera::database))]
    Database(#[from] planera_mysql::MysqlError),

    /// Planning or migration error.
    #[error("Migration error: {0}")]
    #[diagnostic(code(planera::migration))]
    Migration(#[from] planera_migrate::MigrationError),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("failed to parse TOML: {}", err))
    }
}
