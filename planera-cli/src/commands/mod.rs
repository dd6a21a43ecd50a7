//! Command implementations.

use std::path::PathBuf;

use planera_mysql::{MysqlConfig, MysqlSession};

use crate::error::{CliError, CliResult};

pub mod apply;
pub mod migrate;
pub mod plan;

/// Resolved global options shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// MySQL connection URL, if provided.
    pub database_url: Option<String>,
    /// Path of the plan artifact.
    pub plan_file: PathBuf,
    /// Directory holding migration scripts.
    pub migrations_dir: PathBuf,
}

impl CommandContext {
    fn require_database_url(&self) -> CliResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CliError::Config(
                "no database URL; set DATABASE_URL or pass --database-url".to_string(),
            )
        })
    }

    /// Open the session every command shares.
    pub async fn connect(&self) -> CliResult<MysqlSession> {
        let config = MysqlConfig::from_url(self.require_database_url()?)?;
        Ok(MysqlSession::connect(&config).await?)
    }
}
