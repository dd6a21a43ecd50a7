//! `planera migrate` - run, revert, or scaffold migration scripts.

use planera_migrate::{
    ApplyOptions, MigrationRegistry, MigrationRunner, MysqlLedger, generate_script,
};
use planera_mysql::MysqlSession;

use crate::cli::MigrateArgs;
use crate::commands::CommandContext;
use crate::error::CliResult;
use crate::output;

/// Run the migrate command.
pub async fn run(
    ctx: &CommandContext,
    args: MigrateArgs,
    registry: MigrationRegistry,
) -> CliResult<()> {
    output::header("Migrate");

    // Scaffolding is purely local.
    if let Some(name) = &args.generate {
        let path = generate_script(&ctx.migrations_dir, name)?;
        output::success(&format!("Generated {}", path.display()));
        output::dim("Implement the script, register it, then run `planera migrate`.");
        return Ok(());
    }

    let session = ctx.connect().await?;
    let runner = MigrationRunner::new(
        MysqlLedger::new(session.clone()),
        session.clone(),
        registry,
        &ctx.migrations_dir,
    );
    let result = execute(&runner, &args).await;
    let close = session.close().await;
    result?;
    close?;
    Ok(())
}

async fn execute(
    runner: &MigrationRunner<MysqlLedger, MysqlSession>,
    args: &MigrateArgs,
) -> CliResult<()> {
    if let Some(count) = args.revert {
        let reverted = runner.revert(count).await?;
        for name in &reverted {
            output::list_item(name);
        }
        output::success(&format!("Reverted {} migrations", reverted.len()));
        return Ok(());
    }

    let options = ApplyOptions {
        overwrite: args.overwrite.iter().cloned().collect(),
        force: args.force,
    };
    let summary = runner.apply(&options).await?;
    if summary.applied.is_empty() && summary.checksum_updates.is_empty() {
        output::info("Nothing to do; ledger matches local scripts");
        return Ok(());
    }
    for name in &summary.applied {
        output::list_item(name);
    }
    if !summary.applied.is_empty() {
        output::success(&format!("Ran {} migrations", summary.applied.len()));
    }
    for name in &summary.checksum_updates {
        output::warn(&format!("Replaced recorded checksum for '{name}'"));
    }
    Ok(())
}
