//! Error types for planning and migration.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while planning or running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity declaration error.
    #[error("declaration error: {0}")]
    Declaration(#[from] planera_schema::SchemaError),

    /// Database operation error.
    #[error("database error: {0}")]
    Database(String),

    /// Introspection returned an unexpected shape.
    #[error("introspection error: {0}")]
    Introspection(String),

    /// A recorded migration's checksum no longer matches its script.
    #[error(
        "checksum drift for migration '{name}': recorded {expected}, local {actual}; \
         rerun with --overwrite {name} if the edit is intentional"
    )]
    Drift {
        /// Migration name.
        name: String,
        /// Checksum in the ledger.
        expected: String,
        /// Checksum of the local script.
        actual: String,
    },

    /// A previous run of this migration never finished.
    #[error("migration '{name}' started but never finished; repair the database before retrying")]
    IncompleteMigration {
        /// Migration name.
        name: String,
    },

    /// Local scripts and the ledger disagree on migration order.
    #[error("ledger mismatch at position {position}: ledger has '{expected}', local is '{found}'")]
    LedgerMismatch {
        /// 1-based position in the ordered history.
        position: usize,
        /// Name recorded in the ledger.
        expected: String,
        /// Name found locally.
        found: String,
    },

    /// A planned statement failed during apply.
    #[error("statement {position} failed: {message}\n{statement}")]
    StatementFailed {
        /// 1-based position in the plan.
        position: usize,
        /// The offending statement.
        statement: String,
        /// Driver error message.
        message: String,
    },

    /// A migration script raised an error.
    #[error("migration '{name}' failed: {message}")]
    ScriptFailed {
        /// Migration name.
        name: String,
        /// Underlying error message.
        message: String,
    },

    /// A migration does not implement revert.
    #[error("migration '{name}' does not implement revert")]
    RevertNotImplemented {
        /// Migration name.
        name: String,
    },

    /// Revert count out of range.
    #[error("cannot revert {requested} migrations; only {applied} applied")]
    RevertCount {
        /// How many reverts were requested.
        requested: usize,
        /// How many migrations are applied.
        applied: usize,
    },

    /// Migration name does not match the allowed pattern.
    #[error("invalid migration name '{0}': use lowercase letters and dashes, starting with a letter")]
    InvalidMigrationName(String),

    /// A ledger entry has no matching registered migration.
    #[error("no registered migration named '{0}'")]
    UnknownMigration(String),
}

impl From<planera_mysql::MysqlError> for MigrationError {
    fn from(err: planera_mysql::MysqlError) -> Self {
        Self::Database(err.to_string())
    }
}
