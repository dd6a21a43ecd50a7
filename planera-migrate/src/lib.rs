//! Schema planning and migration engine.
//!
//! Two complementary workflows share one database session:
//!
//! 1. **Planning**: declared entities are compared against the live
//!    database ([`MysqlIntrospector`] + [`SchemaDiffer`]) and the
//!    resulting DDL is written to a reviewable plan file ([`PlanFile`]),
//!    which [`apply_statements`] later executes verbatim.
//! 2. **Migrations**: one-off data changes live as timestamped Rust
//!    scripts whose compiled behavior is registered in a
//!    [`MigrationRegistry`]. The [`MigrationRunner`] reconciles them
//!    against a checksummed ledger (`_migrations`) and runs what is
//!    pending, in order, exactly once.
//!
//! Nothing in the planning path mutates the database; all mutation goes
//! through the plan file or the runner.

pub mod diff;
pub mod error;
pub mod exec;
pub mod introspect;
pub mod ledger;
pub mod plan;
pub mod runner;
pub mod sql;

pub use diff::{ConstraintAdd, ConstraintDrop, SchemaDiff, SchemaDiffer, TableAlter};
pub use error::{MigrateResult, MigrationError};
pub use exec::{SqlExecutor, apply_statements};
pub use introspect::{ForeignKeyState, IndexState, MysqlIntrospector, TableState};
pub use ledger::{LEDGER_TABLE, LedgerRecord, LedgerStore, MysqlLedger};
pub use plan::{DEFAULT_PLAN_PATH, PlanFile};
pub use runner::{
    ApplyOptions, ApplySummary, Migration, MigrationRegistry, MigrationRunner, ScriptFile,
    ScriptLoader, checksum, discover_scripts, generate_script, is_valid_migration_name,
};
pub use sql::{MysqlGenerator, STATEMENT_DELIMITER};
