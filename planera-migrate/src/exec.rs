//! Statement execution against a database session.

use async_trait::async_trait;
use planera_mysql::MysqlSession;
use tracing::info;

use crate::error::{MigrateResult, MigrationError};

/// Anything that can execute one SQL statement.
///
/// Migration scripts receive this rather than a concrete session so they
/// can be exercised in tests without a database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a single statement.
    async fn execute_sql(&self, statement: &str) -> MigrateResult<()>;
}

#[async_trait]
impl SqlExecutor for MysqlSession {
    async fn execute_sql(&self, statement: &str) -> MigrateResult<()> {
        self.execute(statement).await?;
        Ok(())
    }
}

/// Execute a plan's statements in order, stopping at the first failure.
///
/// Returns the number of statements executed. Failure reports the 1-based
/// position and the offending statement.
pub async fn apply_statements(
    executor: &dyn SqlExecutor,
    statements: &[String],
) -> MigrateResult<usize> {
    for (index, statement) in statements.iter().enumerate() {
        info!(position = index + 1, total = statements.len(), "Applying statement");
        executor
            .execute_sql(statement)
            .await
            .map_err(|err| MigrationError::StatementFailed {
                position: index + 1,
                statement: statement.clone(),
                message: err.to_string(),
            })?;
    }
    Ok(statements.len())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records executed statements; optionally fails at one position.
    #[derive(Default)]
    pub struct RecordingExecutor {
        pub executed: Mutex<Vec<String>>,
        /// 1-based position at which to fail, if any.
        pub fail_at: Option<usize>,
    }

    impl RecordingExecutor {
        pub fn failing_at(position: usize) -> Self {
            Self {
                executed: Mutex::default(),
                fail_at: Some(position),
            }
        }
    }

    #[async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn execute_sql(&self, statement: &str) -> MigrateResult<()> {
            let mut executed = self.executed.lock().unwrap();
            if self.fail_at == Some(executed.len() + 1) {
                return Err(MigrationError::Database("simulated failure".to_string()));
            }
            executed.push(statement.to_string());
            Ok(())
        }
    }
}
