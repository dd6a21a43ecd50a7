//! `planera apply` - execute the plan, then run pending migrations.

use planera_migrate::{
    ApplyOptions, MigrationRegistry, MigrationRunner, MysqlLedger, PlanFile, apply_statements,
};
use planera_mysql::MysqlSession;

use crate::commands::CommandContext;
use crate::error::CliResult;
use crate::output;

/// Run the apply command.
///
/// Statements come from the plan artifact verbatim; pending migrations run
/// afterwards with checksum overwrite forced, matching what `plan` saw.
pub async fn run(ctx: &CommandContext, registry: MigrationRegistry) -> CliResult<()> {
    output::header("Apply");

    let statements = PlanFile::new(&ctx.plan_file).read().await?;
    let session = ctx.connect().await?;
    let result = execute(ctx, &session, &statements, registry).await;
    let close = session.close().await;
    result?;
    close?;
    Ok(())
}

async fn execute(
    ctx: &CommandContext,
    session: &MysqlSession,
    statements: &[String],
    registry: MigrationRegistry,
) -> CliResult<()> {
    if statements.is_empty() {
        output::info("Plan is empty; no schema changes to apply");
    } else {
        let count = apply_statements(session, statements).await?;
        output::success(&format!("Executed {count} schema statements"));
    }

    let runner = MigrationRunner::new(
        MysqlLedger::new(session.clone()),
        session.clone(),
        registry,
        &ctx.migrations_dir,
    );
    let summary = runner.apply(&ApplyOptions::forced()).await?;
    if summary.applied.is_empty() {
        output::info("No pending migrations");
    } else {
        for name in &summary.applied {
            output::list_item(name);
        }
        output::success(&format!("Ran {} migrations", summary.applied.len()));
    }
    for name in &summary.checksum_updates {
        output::warn(&format!("Replaced recorded checksum for '{name}'"));
    }
    Ok(())
}
