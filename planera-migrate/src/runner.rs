//! Migration discovery and the apply/revert runner.
//!
//! Migration scripts are Rust source files in a directory, named
//! `<timestamp>-<name>.rs` so lexicographic order is application order.
//! The compiled behavior for each script is registered in a
//! [`MigrationRegistry`] under the script's file stem; the files
//! themselves supply ordering and checksums.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use convert_case::{Case, Casing};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::exec::SqlExecutor;
use crate::ledger::{LedgerRecord, LedgerStore};

/// Checksum of a script's contents, as lowercase hex.
pub fn checksum(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a migration name: lowercase letters and dashes, starting with
/// a letter.
pub fn is_valid_migration_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c == '-')
}

/// One migration script found on disk.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    /// File stem, used as the migration name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
}

impl ScriptFile {
    /// Checksum of this script.
    pub fn checksum(&self) -> String {
        checksum(&self.contents)
    }
}

/// Find migration scripts in a directory, sorted by filename.
///
/// A missing directory yields no scripts.
pub fn discover_scripts(dir: &Path) -> MigrateResult<Vec<ScriptFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut scripts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let contents = std::fs::read_to_string(&path)?;
        scripts.push(ScriptFile {
            name: name.to_string(),
            path,
            contents,
        });
    }
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

/// Behavior of one migration.
///
/// `down` defaults to refusing: a migration is only revertible if its
/// author implemented the reverse. When a revert is refused the ledger
/// row is kept, so the migration still counts as applied.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Apply the migration.
    async fn up(&self, executor: &dyn SqlExecutor) -> MigrateResult<()>;

    /// Revert the migration.
    async fn down(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
        Err(MigrationError::RevertNotImplemented {
            name: String::new(),
        })
    }
}

/// Resolves a migration name to its compiled behavior.
///
/// The default implementation is [`MigrationRegistry`]; applications with
/// their own resolution scheme can plug in a different loader.
pub trait ScriptLoader: Send + Sync {
    /// Resolve a migration by name.
    fn load(&self, name: &str) -> Option<Arc<dyn Migration>>;
}

/// Maps migration names to their compiled behavior.
#[derive(Default, Clone)]
pub struct MigrationRegistry {
    migrations: HashMap<String, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration under its script's file stem.
    pub fn register(&mut self, name: impl Into<String>, migration: impl Migration + 'static) {
        self.migrations.insert(name.into(), Arc::new(migration));
    }

    /// Look up a migration by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Migration>> {
        self.migrations.get(name).cloned()
    }

    /// Whether any migrations are registered.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl ScriptLoader for MigrationRegistry {
    fn load(&self, name: &str) -> Option<Arc<dyn Migration>> {
        self.get(name)
    }
}

/// Options for an apply run.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Migrations whose recorded checksum may be replaced.
    pub overwrite: HashSet<String>,
    /// Replace every drifted checksum without asking.
    pub force: bool,
}

impl ApplyOptions {
    /// Allow every checksum to be replaced.
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Default::default()
        }
    }
}

/// Outcome of an apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Migrations that ran to completion.
    pub applied: Vec<String>,
    /// Migrations whose recorded checksum was replaced.
    pub checksum_updates: Vec<String>,
}

/// Reconciles scripts against the ledger and runs what is pending.
pub struct MigrationRunner<L, E, S = MigrationRegistry> {
    ledger: L,
    executor: E,
    loader: S,
    scripts_dir: PathBuf,
}

impl<L: LedgerStore, E: SqlExecutor, S: ScriptLoader> MigrationRunner<L, E, S> {
    /// A runner over the given ledger, executor, and loader.
    pub fn new(ledger: L, executor: E, loader: S, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            ledger,
            executor,
            loader,
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Reconcile the ledger against local scripts, then run every
    /// pending migration in order.
    ///
    /// Reconciliation checks each recorded position: the name must match
    /// the local script, the run must have finished, and the checksum
    /// must match unless the caller allows replacing it.
    pub async fn apply(&self, options: &ApplyOptions) -> MigrateResult<ApplySummary> {
        self.ledger.ensure_table().await?;
        let scripts = discover_scripts(&self.scripts_dir)?;
        let records = self.ledger.records().await?;

        if records.len() > scripts.len() {
            let extra = &records[scripts.len()];
            return Err(MigrationError::LedgerMismatch {
                position: scripts.len() + 1,
                expected: extra.migration_name.clone(),
                found: "(no local script)".to_string(),
            });
        }

        let mut summary = ApplySummary::default();
        for (index, script) in scripts.iter().enumerate() {
            let local_checksum = script.checksum();
            match records.get(index) {
                Some(record) => {
                    if record.migration_name != script.name {
                        return Err(MigrationError::LedgerMismatch {
                            position: index + 1,
                            expected: record.migration_name.clone(),
                            found: script.name.clone(),
                        });
                    }
                    if record.finished_at.is_none() {
                        return Err(MigrationError::IncompleteMigration {
                            name: record.migration_name.clone(),
                        });
                    }
                    if record.checksum != local_checksum {
                        if options.force || options.overwrite.contains(&script.name) {
                            warn!(name = %script.name, "Replacing recorded checksum");
                            self.ledger
                                .update_checksum(&record.uuid, &local_checksum)
                                .await?;
                            summary.checksum_updates.push(script.name.clone());
                        } else {
                            return Err(MigrationError::Drift {
                                name: script.name.clone(),
                                expected: record.checksum.clone(),
                                actual: local_checksum,
                            });
                        }
                    }
                }
                None => {
                    self.run_pending(script, &local_checksum).await?;
                    summary.applied.push(script.name.clone());
                }
            }
        }
        Ok(summary)
    }

    async fn run_pending(&self, script: &ScriptFile, local_checksum: &str) -> MigrateResult<()> {
        let migration = self
            .loader
            .load(&script.name)
            .ok_or_else(|| MigrationError::UnknownMigration(script.name.clone()))?;

        info!(name = %script.name, "Running migration");
        let record = LedgerRecord::started(&script.name, local_checksum);
        self.ledger.insert_started(&record).await?;

        // On failure the row stays unfinished, blocking later runs until
        // the database is repaired.
        migration
            .up(&self.executor)
            .await
            .map_err(|err| MigrationError::ScriptFailed {
                name: script.name.clone(),
                message: err.to_string(),
            })?;

        self.ledger.mark_finished(&record.uuid, Utc::now()).await?;
        Ok(())
    }

    /// Revert the last `count` applied migrations, newest first.
    ///
    /// A record that never finished is removed without running its
    /// revert; the forward migration did not complete.
    pub async fn revert(&self, count: usize) -> MigrateResult<Vec<String>> {
        self.ledger.ensure_table().await?;
        let records = self.ledger.records().await?;
        let applied = records.len();
        if count == 0 || count > applied {
            return Err(MigrationError::RevertCount {
                requested: count,
                applied,
            });
        }

        let mut reverted = Vec::with_capacity(count);
        for record in records.iter().rev().take(count) {
            if record.finished_at.is_some() {
                let migration = self
                    .loader
                    .load(&record.migration_name)
                    .ok_or_else(|| MigrationError::UnknownMigration(record.migration_name.clone()))?;

                info!(name = %record.migration_name, "Reverting migration");
                match migration.down(&self.executor).await {
                    Ok(()) => {}
                    Err(MigrationError::RevertNotImplemented { .. }) => {
                        return Err(MigrationError::RevertNotImplemented {
                            name: record.migration_name.clone(),
                        });
                    }
                    Err(err) => {
                        return Err(MigrationError::ScriptFailed {
                            name: record.migration_name.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            } else {
                warn!(name = %record.migration_name, "Removing unfinished record without revert");
            }
            self.ledger.remove(&record.uuid).await?;
            reverted.push(record.migration_name.clone());
        }
        Ok(reverted)
    }

}

/// Create a new timestamped migration script scaffold.
///
/// Touches only the filesystem, never the ledger.
pub fn generate_script(scripts_dir: &Path, name: &str) -> MigrateResult<PathBuf> {
    if !is_valid_migration_name(name) {
        return Err(MigrationError::InvalidMigrationName(name.to_string()));
    }
    std::fs::create_dir_all(scripts_dir)?;

    let stamp = Utc::now().format("%Y-%m-%d-%H-%M");
    let path = scripts_dir.join(format!("{stamp}-{name}.rs"));
    std::fs::write(&path, scaffold(name))?;
    info!(path = %path.display(), "Generated migration");
    Ok(path)
}

fn scaffold(name: &str) -> String {
    let type_name = name.to_case(Case::Pascal);
    format!(
        "use async_trait::async_trait;\n\
         use planera_migrate::{{MigrateResult, Migration, MigrationError, SqlExecutor}};\n\
         \n\
         pub struct {type_name};\n\
         \n\
         #[async_trait]\n\
         impl Migration for {type_name} {{\n\
         \x20   async fn up(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {{\n\
         \x20       Err(MigrationError::ScriptFailed {{\n\
         \x20           name: \"{name}\".to_string(),\n\
         \x20           message: \"not implemented\".to_string(),\n\
         \x20       }})\n\
         \x20   }}\n\
         }}\n"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use crate::ledger::testing::MemoryLedger;

    struct NoOp;

    #[async_trait]
    impl Migration for NoOp {
        async fn up(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Migration for Failing {
        async fn up(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
            Err(MigrationError::Database("boom".to_string()))
        }
    }

    /// Records up/down invocations in a shared log.
    struct Logged {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        revertible: bool,
    }

    #[async_trait]
    impl Migration for Logged {
        async fn up(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
            self.log.lock().unwrap().push(format!("up:{}", self.name));
            Ok(())
        }

        async fn down(&self, executor: &dyn SqlExecutor) -> MigrateResult<()> {
            if !self.revertible {
                // Fall back to the default behavior.
                return Err(MigrationError::RevertNotImplemented {
                    name: String::new(),
                });
            }
            let _ = executor;
            self.log.lock().unwrap().push(format!("down:{}", self.name));
            Ok(())
        }
    }

    fn write_script(dir: &TempDir, stem: &str, contents: &str) {
        std::fs::write(dir.path().join(format!("{stem}.rs")), contents).unwrap();
    }

    fn runner_with(
        dir: &TempDir,
        ledger: MemoryLedger,
        registry: MigrationRegistry,
    ) -> MigrationRunner<MemoryLedger, RecordingExecutor> {
        MigrationRunner::new(ledger, RecordingExecutor::default(), registry, dir.path())
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        let sum = checksum("hello");
        assert_eq!(sum.len(), 64);
        assert_eq!(
            sum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_migration_name_validation() {
        assert!(is_valid_migration_name("create-accounts"));
        assert!(is_valid_migration_name("a"));
        assert!(!is_valid_migration_name(""));
        assert!(!is_valid_migration_name("-leading-dash"));
        assert!(!is_valid_migration_name("CamelCase"));
        assert!(!is_valid_migration_name("with_underscore"));
        assert!(!is_valid_migration_name("digits2"));
    }

    #[test]
    fn test_discover_scripts_sorted_by_filename() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-02-01-00-00-second", "b");
        write_script(&dir, "2024-01-01-00-00-first", "a");
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let scripts = discover_scripts(dir.path()).unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].name, "2024-01-01-00-00-first");
        assert_eq!(scripts[1].name, "2024-02-01-00-00-second");
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let scripts = discover_scripts(&dir.path().join("absent")).unwrap();
        assert!(scripts.is_empty());
    }

    #[tokio::test]
    async fn test_apply_runs_pending_in_order() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-first", "one");
        write_script(&dir, "2024-01-02-00-00-second", "two");

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = MigrationRegistry::new();
        registry.register(
            "2024-01-01-00-00-first",
            Logged {
                name: "first",
                log: log.clone(),
                revertible: false,
            },
        );
        registry.register(
            "2024-01-02-00-00-second",
            Logged {
                name: "second",
                log: log.clone(),
                revertible: false,
            },
        );

        let runner = runner_with(&dir, MemoryLedger::default(), registry);
        let summary = runner.apply(&ApplyOptions::default()).await.unwrap();

        assert_eq!(
            summary.applied,
            vec![
                "2024-01-01-00-00-first".to_string(),
                "2024-01-02-00-00-second".to_string()
            ]
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec!["up:first".to_string(), "up:second".to_string()]
        );
        let records = runner.ledger.records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.finished_at.is_some()));
    }

    #[tokio::test]
    async fn test_apply_skips_recorded_and_runs_the_rest() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-first", "one");
        write_script(&dir, "2024-01-02-00-00-second", "two");
        write_script(&dir, "2024-01-03-00-00-third", "three");

        let mut a = LedgerRecord::started("2024-01-01-00-00-first", checksum("one"));
        a.finished_at = Some(Utc::now());
        let mut b = LedgerRecord::started("2024-01-02-00-00-second", checksum("two"));
        b.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![a, b]);

        // Only the pending script needs a registered behavior.
        let mut registry = MigrationRegistry::new();
        registry.register("2024-01-03-00-00-third", NoOp);

        let runner = runner_with(&dir, ledger, registry);
        let summary = runner.apply(&ApplyOptions::default()).await.unwrap();

        assert_eq!(summary.applied, vec!["2024-01-03-00-00-third".to_string()]);
        assert!(summary.checksum_updates.is_empty());
        assert_eq!(runner.ledger.records().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_apply_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-only", "one");

        let mut registry = MigrationRegistry::new();
        registry.register("2024-01-01-00-00-only", NoOp);

        let runner = runner_with(&dir, MemoryLedger::default(), registry);
        let first = runner.apply(&ApplyOptions::default()).await.unwrap();
        assert_eq!(first.applied.len(), 1);

        let second = runner.apply(&ApplyOptions::default()).await.unwrap();
        assert!(second.applied.is_empty());
        assert!(second.checksum_updates.is_empty());
    }

    #[tokio::test]
    async fn test_positional_name_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-renamed", "one");

        let mut record = LedgerRecord::started("2024-01-01-00-00-original", checksum("one"));
        record.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![record]);

        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::LedgerMismatch { position: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_extra_ledger_rows_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut record = LedgerRecord::started("2024-01-01-00-00-gone", "x".to_string());
        record.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![record]);

        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::LedgerMismatch { position: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_unfinished_record_blocks_apply() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-stuck", "one");

        let record = LedgerRecord::started("2024-01-01-00-00-stuck", checksum("one"));
        let ledger = MemoryLedger::with_records(vec![record]);

        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(err, MigrationError::IncompleteMigration { .. }));
    }

    #[tokio::test]
    async fn test_drift_is_rejected_without_overwrite() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-edited", "new contents");

        let mut record = LedgerRecord::started("2024-01-01-00-00-edited", checksum("old contents"));
        record.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![record]);

        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(err, MigrationError::Drift { .. }));
    }

    #[tokio::test]
    async fn test_overwrite_updates_checksum_without_rerunning() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-edited", "new contents");

        let mut record = LedgerRecord::started("2024-01-01-00-00-edited", checksum("old contents"));
        record.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![record]);

        // Empty registry: if the runner tried to re-run, it would fail.
        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let options = ApplyOptions {
            overwrite: HashSet::from(["2024-01-01-00-00-edited".to_string()]),
            force: false,
        };
        let summary = runner.apply(&options).await.unwrap();

        assert_eq!(
            summary.checksum_updates,
            vec!["2024-01-01-00-00-edited".to_string()]
        );
        assert!(summary.applied.is_empty());
        let records = runner.ledger.records().await.unwrap();
        assert_eq!(records[0].checksum, checksum("new contents"));
    }

    #[tokio::test]
    async fn test_force_updates_every_drifted_checksum() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-a", "a2");
        write_script(&dir, "2024-01-02-00-00-b", "b2");

        let mut first = LedgerRecord::started("2024-01-01-00-00-a", checksum("a1"));
        first.finished_at = Some(Utc::now());
        let mut second = LedgerRecord::started("2024-01-02-00-00-b", checksum("b1"));
        second.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![first, second]);

        let runner = runner_with(&dir, ledger, MigrationRegistry::new());
        let summary = runner.apply(&ApplyOptions::forced()).await.unwrap();
        assert_eq!(summary.checksum_updates.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_migration_leaves_unfinished_row() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-bad", "one");

        let mut registry = MigrationRegistry::new();
        registry.register("2024-01-01-00-00-bad", Failing);

        let runner = runner_with(&dir, MemoryLedger::default(), registry);
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(err, MigrationError::ScriptFailed { .. }));

        let records = runner.ledger.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].finished_at.is_none());

        // The next run refuses until the row is repaired.
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(err, MigrationError::IncompleteMigration { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_pending_migration_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "2024-01-01-00-00-mystery", "one");

        let runner = runner_with(&dir, MemoryLedger::default(), MigrationRegistry::new());
        let err = runner.apply(&ApplyOptions::default()).await.unwrap_err();
        assert!(matches!(err, MigrationError::UnknownMigration(_)));
    }

    #[tokio::test]
    async fn test_revert_runs_down_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut registry = MigrationRegistry::new();
        registry.register(
            "first",
            Logged {
                name: "first",
                log: log.clone(),
                revertible: true,
            },
        );
        registry.register(
            "second",
            Logged {
                name: "second",
                log: log.clone(),
                revertible: true,
            },
        );

        let mut a = LedgerRecord::started("first", "x");
        a.finished_at = Some(Utc::now());
        let mut b = LedgerRecord::started("second", "y");
        b.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![a, b]);

        let runner = runner_with(&dir, ledger, registry);
        let reverted = runner.revert(2).await.unwrap();

        assert_eq!(reverted, vec!["second".to_string(), "first".to_string()]);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["down:second".to_string(), "down:first".to_string()]
        );
        assert!(runner.ledger.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revert_without_down_names_the_migration() {
        let dir = TempDir::new().unwrap();
        let mut registry = MigrationRegistry::new();
        registry.register("irreversible", NoOp);

        let mut record = LedgerRecord::started("irreversible", "x");
        record.finished_at = Some(Utc::now());
        let ledger = MemoryLedger::with_records(vec![record]);

        let runner = runner_with(&dir, ledger, registry);
        let err = runner.revert(1).await.unwrap_err();
        match err {
            MigrationError::RevertNotImplemented { name } => assert_eq!(name, "irreversible"),
            other => panic!("unexpected error: {other}"),
        }
        // The row is kept when the revert refuses.
        assert_eq!(runner.ledger.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revert_skips_down_for_unfinished_record() {
        let dir = TempDir::new().unwrap();
        let ran = Arc::new(AtomicBool::new(false));

        struct Tracking(Arc<AtomicBool>);
        #[async_trait]
        impl Migration for Tracking {
            async fn up(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
                Ok(())
            }
            async fn down(&self, _executor: &dyn SqlExecutor) -> MigrateResult<()> {
                self.0.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let mut registry = MigrationRegistry::new();
        registry.register("stuck", Tracking(ran.clone()));

        // Never finished: the forward run was interrupted.
        let ledger = MemoryLedger::with_records(vec![LedgerRecord::started("stuck", "x")]);

        let runner = runner_with(&dir, ledger, registry);
        let reverted = runner.revert(1).await.unwrap();

        assert_eq!(reverted, vec!["stuck".to_string()]);
        assert!(!ran.load(Ordering::SeqCst));
        assert!(runner.ledger.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revert_count_out_of_range() {
        let dir = TempDir::new().unwrap();
        let runner = runner_with(&dir, MemoryLedger::default(), MigrationRegistry::new());

        let err = runner.revert(1).await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::RevertCount {
                requested: 1,
                applied: 0
            }
        ));
        let err = runner.revert(0).await.unwrap_err();
        assert!(matches!(err, MigrationError::RevertCount { .. }));
    }

    #[test]
    fn test_generate_writes_scaffold() {
        let dir = TempDir::new().unwrap();
        let scripts_dir = dir.path().join("migrations");

        let path = generate_script(&scripts_dir, "add-views").unwrap();
        let stem = path.file_stem().unwrap().to_str().unwrap();
        assert!(stem.ends_with("-add-views"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("pub struct AddViews;"));
        assert!(contents.contains("impl Migration for AddViews"));
        assert!(contents.contains("not implemented"));
    }

    #[test]
    fn test_generate_rejects_invalid_names() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            generate_script(dir.path(), "Bad Name").unwrap_err(),
            MigrationError::InvalidMigrationName(_)
        ));
    }
}
