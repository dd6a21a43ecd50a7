//! `planera plan` - diff the declared schema against the database.

use planera_migrate::{MysqlGenerator, MysqlIntrospector, PlanFile, SchemaDiffer};
use planera_mysql::MysqlSession;
use planera_schema::{EntityDescriptor, TableSpec};

use crate::commands::CommandContext;
use crate::error::CliResult;
use crate::output;

/// Run the plan command. Reads the database, never writes to it.
pub async fn run(ctx: &CommandContext, entities: &[EntityDescriptor]) -> CliResult<()> {
    output::header("Plan");

    let expected: Vec<TableSpec> = entities.iter().map(|e| e.table().clone()).collect();
    let session = ctx.connect().await?;
    let result = build_plan(ctx, &session, &expected).await;
    let close = session.close().await;
    let statements = result?;
    close?;

    if statements.is_empty() {
        output::success("Schema is in sync; wrote an empty plan");
        return Ok(());
    }
    for statement in &statements {
        output::sql(statement);
    }
    output::newline();
    output::kv("Statements", &statements.len().to_string());
    output::kv("Plan", &ctx.plan_file.display().to_string());
    output::newline();
    output::dim("Review the plan, then run `planera apply`.");
    Ok(())
}

async fn build_plan(
    ctx: &CommandContext,
    session: &MysqlSession,
    expected: &[TableSpec],
) -> CliResult<Vec<String>> {
    let actual = MysqlIntrospector::new(session.clone()).tables().await?;
    let diff = SchemaDiffer::diff(expected, &actual);
    output::info(&diff.summary());

    let statements = MysqlGenerator::statements(&diff);
    PlanFile::new(&ctx.plan_file).write(&statements).await?;
    Ok(statements)
}
