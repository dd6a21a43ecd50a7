//! Plan file persistence.
//!
//! A plan is the rendered statement list written to disk by `plan` and
//! consumed by `apply`. The file is overwritten on every plan run; a
//! missing file simply means there is nothing to apply.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::MigrateResult;
use crate::sql::STATEMENT_DELIMITER;

/// Default location of the plan file, relative to the working directory.
pub const DEFAULT_PLAN_PATH: &str = "out/plan.sql";

/// Reads and writes plan files.
#[derive(Debug, Clone)]
pub struct PlanFile {
    path: PathBuf,
}

impl PlanFile {
    /// A plan file at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The plan file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write statements to the plan file, replacing any previous plan.
    /// Parent directories are created as needed.
    pub async fn write(&self, statements: &[String]) -> MigrateResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(path = %self.path.display(), count = statements.len(), "Writing plan");
        tokio::fs::write(&self.path, statements.join(STATEMENT_DELIMITER)).await?;
        Ok(())
    }

    /// Read statements back from the plan file.
    ///
    /// A missing file yields an empty plan.
    pub async fn read(&self) -> MigrateResult<Vec<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No plan file");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(contents
            .split(STATEMENT_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}
