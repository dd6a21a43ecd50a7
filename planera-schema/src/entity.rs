//! Entity descriptors: the declarative input to planning.

use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldBuilder, FieldDescriptor, FieldRole};
use crate::names;
use crate::table::{ColumnShape, ConstraintSet, ForeignKey, TableSpec};

/// Declarative definition of one logical table.
///
/// Built through [`EntityDescriptor::builder`]; building validates the
/// declaration and resolves the physical [`TableSpec`] eagerly, so every
/// descriptor that exists is well-formed.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    table: TableSpec,
}

impl EntityDescriptor {
    /// Start declaring an entity.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            name: name.into(),
            fields: Vec::new(),
            unique_groups: Vec::new(),
            index_groups: Vec::new(),
        }
    }

    /// Logical entity name, as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical table name (pluralized snake_case).
    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The resolved physical table shape.
    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    /// Consume the descriptor, keeping only the physical shape.
    pub fn into_table(self) -> TableSpec {
        self.table
    }
}

/// Builder for an [`EntityDescriptor`].
#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    fields: Vec<FieldBuilder>,
    unique_groups: Vec<Vec<String>>,
    index_groups: Vec<Vec<String>>,
}

impl EntityBuilder {
    /// Add a field declaration.
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a table-level composite unique group. Column order within
    /// the group is preserved.
    pub fn unique_group<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_groups
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a table-level composite index group.
    pub fn index_group<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_groups
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the declaration and resolve its physical shape.
    pub fn build(self) -> SchemaResult<EntityDescriptor> {
        if self.fields.is_empty() {
            return Err(SchemaError::EmptyEntity(self.name));
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        // column name -> logical field name, for collision reporting
        let mut seen: HashMap<String, String> = HashMap::new();
        for builder in self.fields {
            let logical = builder.name().to_string();
            let column = names::to_column_name(&logical);
            if names::is_reserved(&column) {
                return Err(SchemaError::ReservedColumnName(column));
            }
            if let Some(first) = seen.get(&column) {
                return Err(SchemaError::ColumnCollision {
                    first: first.clone(),
                    second: logical,
                    column,
                });
            }
            seen.insert(column, logical);
            fields.push(builder.build()?);
        }

        let table_name = names::to_table_name(&self.name);
        let constraints =
            resolve_constraints(&self.name, &fields, &self.unique_groups, &self.index_groups)?;

        let mut columns = Vec::with_capacity(fields.len());
        for field in &fields {
            columns.push(ColumnShape {
                name: names::to_column_name(&field.name),
                sql_type: field.sql_type()?,
                nullable: field.nullable,
                default: field.default_value(),
            });
        }

        Ok(EntityDescriptor {
            name: self.name,
            fields,
            table: TableSpec {
                name: table_name,
                columns,
                constraints,
            },
        })
    }
}

/// Aggregate field roles and table-level groups into one constraint set.
///
/// Field-level unique/index annotations come before table-level groups,
/// each in declaration order.
fn resolve_constraints(
    entity: &str,
    fields: &[FieldDescriptor],
    unique_groups: &[Vec<String>],
    index_groups: &[Vec<String>],
) -> SchemaResult<ConstraintSet> {
    let mut set = ConstraintSet::default();

    for field in fields {
        let column = names::to_column_name(&field.name);
        match field.role {
            Some(FieldRole::Primary) => {
                if let Some(existing) = &set.primary_key {
                    return Err(SchemaError::MultiplePrimaryFields {
                        entity: entity.to_string(),
                        first: existing.clone(),
                        second: column,
                    });
                }
                set.primary_key = Some(column);
            }
            Some(FieldRole::Unique) => set.unique_groups.push(vec![column]),
            Some(FieldRole::Index) => set.index_groups.push(vec![column]),
            Some(FieldRole::Foreign) => {
                set.foreign_keys.push(foreign_key_for(field, &column)?);
            }
            None => {}
        }
    }

    let known: Vec<String> = fields
        .iter()
        .map(|f| names::to_column_name(&f.name))
        .collect();
    for group in unique_groups {
        set.unique_groups.push(resolve_group(entity, group, &known)?);
    }
    for group in index_groups {
        set.index_groups.push(resolve_group(entity, group, &known)?);
    }

    Ok(set)
}

fn resolve_group(entity: &str, group: &[String], known: &[String]) -> SchemaResult<Vec<String>> {
    let mut columns = Vec::with_capacity(group.len());
    for member in group {
        let column = names::to_column_name(member);
        if !known.contains(&column) {
            return Err(SchemaError::UnknownGroupField {
                entity: entity.to_string(),
                field: member.clone(),
            });
        }
        columns.push(column);
    }
    Ok(columns)
}

/// Resolve a foreign key target: explicit references win, otherwise the
/// column name is split on its last underscore (`account_uuid` references
/// `accounts.uuid`).
fn foreign_key_for(field: &FieldDescriptor, column: &str) -> SchemaResult<ForeignKey> {
    if let Some((table, referenced_column)) = &field.references {
        return Ok(ForeignKey {
            column: column.to_string(),
            table: table.clone(),
            referenced_column: referenced_column.clone(),
        });
    }
    let Some((prefix, referenced_column)) = column.rsplit_once('_') else {
        return Err(SchemaError::UnderivableForeignKey(field.name.clone()));
    };
    Ok(ForeignKey {
        column: column.to_string(),
        table: names::to_table_name(prefix),
        referenced_column: referenced_column.to_string(),
    })
}
