//! Planera CLI - declarative MySQL schema synchronization.
//!
//! Library-first: applications that compile their own migration scripts
//! build an [`AppContext`] with their entities and registry, then hand
//! parsed arguments to [`run_with`]. The shipped binary loads entities
//! from a TOML schema file and carries an empty registry.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use planera_migrate::MigrationRegistry;
use planera_schema::EntityDescriptor;

use crate::cli::{Cli, Command};
use crate::commands::CommandContext;
use crate::error::CliResult;

/// Everything an application contributes to the CLI.
#[derive(Default)]
pub struct AppContext {
    /// Declared entities, in declaration order.
    pub entities: Vec<EntityDescriptor>,
    /// Compiled migration behaviors, keyed by script file stem.
    pub registry: MigrationRegistry,
}

/// Dispatch a parsed command line against an application context.
pub async fn run_with(cli: Cli, app: AppContext) -> CliResult<()> {
    let ctx = CommandContext {
        database_url: cli.database_url,
        plan_file: cli.plan_file,
        migrations_dir: cli.migrations_dir,
    };
    match cli.command {
        Command::Plan => commands::plan::run(&ctx, &app.entities).await,
        Command::Apply => commands::apply::run(&ctx, app.registry).await,
        Command::Migrate(args) => commands::migrate::run(&ctx, args, app.registry).await,
    }
}
