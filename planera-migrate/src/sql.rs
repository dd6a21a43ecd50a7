//! MySQL DDL rendering.
//!
//! Constraint names are deterministic functions of the declaration, which
//! is what lets the differ compare constraints by name alone.

use planera_schema::{ColumnShape, ForeignKey, TableSpec};

use crate::diff::{ConstraintAdd, ConstraintDrop, SchemaDiff, TableAlter};

/// Separator between statements in a plan file.
pub const STATEMENT_DELIMITER: &str = ";\n\n";

/// Name for a unique constraint over the given columns.
pub fn unique_constraint_name(table: &str, columns: &[String]) -> String {
    format!("UC_{}_{}", table, columns.join("_"))
}

/// Name for a plain index over the given columns.
pub fn index_name(columns: &[String]) -> String {
    format!("IX_{}", columns.join("_"))
}

/// Name for a foreign key constraint.
pub fn foreign_key_name(table: &str, fk: &ForeignKey) -> String {
    format!(
        "FK_{}_{}_{}_{}",
        table, fk.column, fk.table, fk.referenced_column
    )
}

/// Renders a [`SchemaDiff`] into executable MySQL statements.
pub struct MysqlGenerator;

impl MysqlGenerator {
    /// Render the full plan: drops first, then creates, then alters.
    pub fn statements(diff: &SchemaDiff) -> Vec<String> {
        let mut statements = Vec::new();
        for table in &diff.drop_tables {
            statements.push(format!("DROP TABLE `{}`", table));
        }
        for spec in &diff.create_tables {
            statements.push(Self::create_table(spec));
        }
        for alter in &diff.alter_tables {
            statements.push(Self::alter_table(alter));
        }
        statements
    }

    /// Render a CREATE TABLE statement with inline constraints.
    pub fn create_table(spec: &TableSpec) -> String {
        let mut lines: Vec<String> = spec
            .columns
            .iter()
            .map(Self::column_definition)
            .collect();

        if let Some(pk) = &spec.constraints.primary_key {
            lines.push(format!("PRIMARY KEY (`{}`)", pk));
        }
        for group in &spec.constraints.unique_groups {
            lines.push(format!(
                "CONSTRAINT `{}` UNIQUE ({})",
                unique_constraint_name(&spec.name, group),
                column_list(group)
            ));
        }
        for group in &spec.constraints.index_groups {
            lines.push(format!(
                "INDEX `{}` ({})",
                index_name(group),
                column_list(group)
            ));
        }
        for fk in &spec.constraints.foreign_keys {
            lines.push(format!(
                "CONSTRAINT `{}` FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`)",
                foreign_key_name(&spec.name, fk),
                fk.column,
                fk.table,
                fk.referenced_column
            ));
        }

        format!("CREATE TABLE `{}` (\n  {}\n)", spec.name, lines.join(",\n  "))
    }

    /// Render an ALTER TABLE statement.
    ///
    /// Clause order within the statement: constraint drops (sorted so
    /// foreign keys go before the indexes that back them), column drops,
    /// column adds, column modifies, constraint adds.
    pub fn alter_table(alter: &TableAlter) -> String {
        let mut drops: Vec<String> = alter
            .drop_constraints
            .iter()
            .map(|drop| match drop {
                ConstraintDrop::ForeignKey(name) => format!("FOREIGN KEY `{}`", name),
                ConstraintDrop::Index(name) => format!("INDEX `{}`", name),
                ConstraintDrop::PrimaryKey => "PRIMARY KEY".to_string(),
            })
            .collect();
        drops.sort();

        let mut clauses: Vec<String> = drops.into_iter().map(|d| format!("DROP {}", d)).collect();
        for column in &alter.drop_columns {
            clauses.push(format!("DROP COLUMN `{}`", column));
        }
        for column in &alter.add_columns {
            clauses.push(format!("ADD COLUMN {}", Self::column_definition(column)));
        }
        for column in &alter.modify_columns {
            clauses.push(format!("MODIFY COLUMN {}", Self::column_definition(column)));
        }
        for add in &alter.add_constraints {
            clauses.push(match add {
                ConstraintAdd::PrimaryKey(column) => format!("ADD PRIMARY KEY (`{}`)", column),
                ConstraintAdd::Unique { name, columns } => {
                    format!("ADD CONSTRAINT `{}` UNIQUE ({})", name, column_list(columns))
                }
                ConstraintAdd::Index { name, columns } => {
                    format!("ADD INDEX `{}` ({})", name, column_list(columns))
                }
                ConstraintAdd::ForeignKey { name, fk } => format!(
                    "ADD CONSTRAINT `{}` FOREIGN KEY (`{}`) REFERENCES `{}` (`{}`)",
                    name, fk.column, fk.table, fk.referenced_column
                ),
            });
        }

        format!("ALTER TABLE `{}`\n  {}", alter.table, clauses.join(",\n  "))
    }

    /// Render one column definition.
    pub fn column_definition(column: &ColumnShape) -> String {
        let mut definition = format!(
            "`{}` {} {}",
            column.name,
            column.sql_type,
            if column.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(default) = &column.default {
            definition.push_str(" DEFAULT ");
            definition.push_str(&render_default(default));
        }
        definition
    }
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Numeric defaults render bare; anything else is double-quoted, so an
/// empty string renders as `DEFAULT ""`.
fn render_default(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}
