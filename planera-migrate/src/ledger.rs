//! The migration ledger.
//!
//! Applied migrations are recorded in a `_migrations` table, one row per
//! run, ordered by start time. The ledger is the source of truth for what
//! has been applied; local scripts are reconciled against it positionally.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use planera_mysql::MysqlSession;
use uuid::Uuid;

use crate::error::{MigrateResult, MigrationError};

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "_migrations";

/// SQL for initializing the ledger table.
pub const MYSQL_INIT_SQL: &str = "\
CREATE TABLE IF NOT EXISTS `_migrations` (
  `uuid` VARCHAR(36) NOT NULL,
  `migration_name` VARCHAR(191) NOT NULL,
  `started_at` DATETIME(3) NOT NULL,
  `finished_at` DATETIME(3) NULL,
  `checksum` VARCHAR(64) NOT NULL,
  PRIMARY KEY (`uuid`)
)";

/// Milliseconds are kept; MySQL DATETIME(3) stores exactly that.
const DATETIME_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DATETIME_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    /// Row identity.
    pub uuid: String,
    /// Migration name (file stem of the script).
    pub migration_name: String,
    /// Checksum of the script at the time it ran.
    pub checksum: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished; `None` marks an interrupted run.
    pub finished_at: Option<DateTime<Utc>>,
}

impl LedgerRecord {
    /// A fresh record for a run that is starting now.
    pub fn started(migration_name: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            migration_name: migration_name.into(),
            checksum: checksum.into(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Storage backend for the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the ledger table if it does not exist.
    async fn ensure_table(&self) -> MigrateResult<()>;

    /// All records, ordered by start time.
    async fn records(&self) -> MigrateResult<Vec<LedgerRecord>>;

    /// Insert a record for a run that is starting.
    async fn insert_started(&self, record: &LedgerRecord) -> MigrateResult<()>;

    /// Mark a run as finished.
    async fn mark_finished(&self, uuid: &str, finished_at: DateTime<Utc>) -> MigrateResult<()>;

    /// Replace the recorded checksum without re-running anything.
    async fn update_checksum(&self, uuid: &str, checksum: &str) -> MigrateResult<()>;

    /// Remove a record (after a successful revert).
    async fn remove(&self, uuid: &str) -> MigrateResult<()>;
}

/// Ledger stored in the session's database.
pub struct MysqlLedger {
    session: MysqlSession,
}

impl MysqlLedger {
    /// A ledger over an open session.
    pub fn new(session: MysqlSession) -> Self {
        Self { session }
    }
}

fn parse_datetime(raw: &str) -> MigrateResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATETIME_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| MigrationError::Introspection(format!("bad ledger timestamp '{raw}': {e}")))
}

#[async_trait]
impl LedgerStore for MysqlLedger {
    async fn ensure_table(&self) -> MigrateResult<()> {
        self.session.execute(MYSQL_INIT_SQL).await?;
        Ok(())
    }

    async fn records(&self) -> MigrateResult<Vec<LedgerRecord>> {
        // Timestamps travel as strings so the driver needs no date types.
        let rows: Vec<(String, String, String, String, Option<String>)> = self
            .session
            .query(
                "SELECT `uuid`, `migration_name`, `checksum`, \
                        DATE_FORMAT(`started_at`, '%Y-%m-%d %H:%i:%s.%f'), \
                        DATE_FORMAT(`finished_at`, '%Y-%m-%d %H:%i:%s.%f') \
                 FROM `_migrations` ORDER BY `started_at` ASC",
            )
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for (uuid, migration_name, checksum, started_at, finished_at) in rows {
            records.push(LedgerRecord {
                uuid,
                migration_name,
                checksum,
                started_at: parse_datetime(&started_at)?,
                finished_at: finished_at.as_deref().map(parse_datetime).transpose()?,
            });
        }
        Ok(records)
    }

    async fn insert_started(&self, record: &LedgerRecord) -> MigrateResult<()> {
        self.session
            .execute_params(
                "INSERT INTO `_migrations` \
                 (`uuid`, `migration_name`, `started_at`, `checksum`) \
                 VALUES (?, ?, ?, ?)",
                (
                    record.uuid.clone(),
                    record.migration_name.clone(),
                    record.started_at.format(DATETIME_WRITE_FORMAT).to_string(),
                    record.checksum.clone(),
                ),
            )
            .await?;
        Ok(())
    }

    async fn mark_finished(&self, uuid: &str, finished_at: DateTime<Utc>) -> MigrateResult<()> {
        self.session
            .execute_params(
                "UPDATE `_migrations` SET `finished_at` = ? WHERE `uuid` = ?",
                (
                    finished_at.format(DATETIME_WRITE_FORMAT).to_string(),
                    uuid.to_string(),
                ),
            )
            .await?;
        Ok(())
    }

    async fn update_checksum(&self, uuid: &str, checksum: &str) -> MigrateResult<()> {
        self.session
            .execute_params(
                "UPDATE `_migrations` SET `checksum` = ? WHERE `uuid` = ?",
                (checksum.to_string(), uuid.to_string()),
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, uuid: &str) -> MigrateResult<()> {
        self.session
            .execute_params(
                "DELETE FROM `_migrations` WHERE `uuid` = ?",
                (uuid.to_string(),),
            )
            .await?;
        Ok(())
    }
}
