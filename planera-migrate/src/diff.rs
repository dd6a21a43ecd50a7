//! Diffing declared tables against observed database state.

use std::collections::HashSet;

use planera_schema::{ColumnShape, ForeignKey, TableSpec};

use crate::introspect::TableState;
use crate::sql::{foreign_key_name, index_name, unique_constraint_name};

/// Tables whose names start with this prefix belong to the toolkit itself
/// and are never dropped or diffed.
pub const INTERNAL_TABLE_PREFIX: &str = "_";

/// The difference between declared and observed schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    /// Tables present in the database but not declared.
    pub drop_tables: Vec<String>,
    /// Declared tables missing from the database.
    pub create_tables: Vec<TableSpec>,
    /// Tables present in both but differing in shape.
    pub alter_tables: Vec<TableAlter>,
}

impl SchemaDiff {
    /// Check if there are any differences.
    pub fn is_empty(&self) -> bool {
        self.drop_tables.is_empty()
            && self.create_tables.is_empty()
            && self.alter_tables.is_empty()
    }

    /// Get a human-readable summary of the diff.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.drop_tables.is_empty() {
            parts.push(format!("Drop {} tables", self.drop_tables.len()));
        }
        if !self.create_tables.is_empty() {
            parts.push(format!("Create {} tables", self.create_tables.len()));
        }
        if !self.alter_tables.is_empty() {
            parts.push(format!("Alter {} tables", self.alter_tables.len()));
        }
        if parts.is_empty() {
            "No changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// A constraint to drop from a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintDrop {
    /// Drop the primary key.
    PrimaryKey,
    /// Drop an index by name (unique or plain).
    Index(String),
    /// Drop a foreign key by constraint name.
    ForeignKey(String),
}

/// A constraint to add to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintAdd {
    /// Add a primary key on one column.
    PrimaryKey(String),
    /// Add a named unique constraint.
    Unique {
        /// Constraint name.
        name: String,
        /// Columns in key order.
        columns: Vec<String>,
    },
    /// Add a named plain index.
    Index {
        /// Index name.
        name: String,
        /// Columns in key order.
        columns: Vec<String>,
    },
    /// Add a named foreign key.
    ForeignKey {
        /// Constraint name.
        name: String,
        /// The declaration.
        fk: ForeignKey,
    },
}

/// Changes needed to bring one existing table in line with its declaration.
#[derive(Debug, Clone)]
pub struct TableAlter {
    /// Table name.
    pub table: String,
    /// Constraints to drop.
    pub drop_constraints: Vec<ConstraintDrop>,
    /// Columns to drop.
    pub drop_columns: Vec<String>,
    /// Columns to add.
    pub add_columns: Vec<ColumnShape>,
    /// Columns to modify to their declared shape.
    pub modify_columns: Vec<ColumnShape>,
    /// Constraints to add.
    pub add_constraints: Vec<ConstraintAdd>,
}

impl TableAlter {
    /// An empty alter for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            drop_constraints: Vec::new(),
            drop_columns: Vec::new(),
            add_columns: Vec::new(),
            modify_columns: Vec::new(),
            add_constraints: Vec::new(),
        }
    }

    /// Whether this alter changes anything.
    pub fn is_empty(&self) -> bool {
        self.drop_constraints.is_empty()
            && self.drop_columns.is_empty()
            && self.add_columns.is_empty()
            && self.modify_columns.is_empty()
            && self.add_constraints.is_empty()
    }
}

/// Computes the diff between declared specs and observed state.
pub struct SchemaDiffer;

impl SchemaDiffer {
    /// Diff declared tables against observed tables.
    ///
    /// Observed tables with the internal prefix are ignored entirely.
    pub fn diff(expected: &[TableSpec], actual: &[TableState]) -> SchemaDiff {
        let expected_names: HashSet<&str> = expected.iter().map(|t| t.name.as_str()).collect();
        let actual_names: HashSet<&str> = actual
            .iter()
            .filter(|t| !t.name.starts_with(INTERNAL_TABLE_PREFIX))
            .map(|t| t.name.as_str())
            .collect();

        let drop_tables: Vec<String> = actual
            .iter()
            .filter(|t| !t.name.starts_with(INTERNAL_TABLE_PREFIX))
            .filter(|t| !expected_names.contains(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect();

        let create_tables: Vec<TableSpec> = expected
            .iter()
            .filter(|t| !actual_names.contains(t.name.as_str()))
            .cloned()
            .collect();

        let mut alter_tables = Vec::new();
        for spec in expected {
            let Some(state) = actual.iter().find(|t| t.name == spec.name) else {
                continue;
            };
            let alter = Self::diff_table(spec, state);
            if !alter.is_empty() {
                alter_tables.push(alter);
            }
        }

        SchemaDiff {
            drop_tables,
            create_tables,
            alter_tables,
        }
    }

    fn diff_table(spec: &TableSpec, state: &TableState) -> TableAlter {
        let mut alter = TableAlter::new(&spec.name);

        // Expected constraint names.
        let expected_unique: Vec<(String, &Vec<String>)> = spec
            .constraints
            .unique_groups
            .iter()
            .map(|g| (unique_constraint_name(&spec.name, g), g))
            .collect();
        let expected_index: Vec<(String, &Vec<String>)> = spec
            .constraints
            .index_groups
            .iter()
            .map(|g| (index_name(g), g))
            .collect();
        let expected_fk: Vec<(String, &ForeignKey)> = spec
            .constraints
            .foreign_keys
            .iter()
            .map(|fk| (foreign_key_name(&spec.name, fk), fk))
            .collect();

        let expected_unique_names: HashSet<&str> =
            expected_unique.iter().map(|(n, _)| n.as_str()).collect();
        let expected_index_names: HashSet<&str> =
            expected_index.iter().map(|(n, _)| n.as_str()).collect();
        let expected_fk_names: HashSet<&str> =
            expected_fk.iter().map(|(n, _)| n.as_str()).collect();

        let actual_unique_names: HashSet<&str> = state
            .unique_indexes
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        let actual_index_names: HashSet<&str> = state
            .plain_indexes
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        let actual_fk_names: HashSet<&str> =
            state.foreign_keys.iter().map(|f| f.name.as_str()).collect();

        // Primary key comparison is by columns, not by name.
        let expected_pk: Vec<String> = spec
            .constraints
            .primary_key
            .iter()
            .cloned()
            .collect();
        let pk_matches = expected_pk == state.primary_key;

        // Constraint drops.
        for fk in &state.foreign_keys {
            if !expected_fk_names.contains(fk.name.as_str()) {
                alter
                    .drop_constraints
                    .push(ConstraintDrop::ForeignKey(fk.name.clone()));
            }
        }
        for index in state.unique_indexes.iter().chain(&state.plain_indexes) {
            let kept = expected_unique_names.contains(index.name.as_str())
                || expected_index_names.contains(index.name.as_str());
            if !kept {
                alter
                    .drop_constraints
                    .push(ConstraintDrop::Index(index.name.clone()));
            }
        }
        if !pk_matches && !state.primary_key.is_empty() {
            alter.drop_constraints.push(ConstraintDrop::PrimaryKey);
        }

        // Column changes.
        let expected_columns: HashSet<&str> =
            spec.columns.iter().map(|c| c.name.as_str()).collect();
        for column in &state.columns {
            if !expected_columns.contains(column.name.as_str()) {
                alter.drop_columns.push(column.name.clone());
            }
        }
        for column in &spec.columns {
            match state.columns.iter().find(|c| c.name == column.name) {
                None => alter.add_columns.push(column.clone()),
                Some(observed) if !column.equivalent(observed) => {
                    alter.modify_columns.push(column.clone());
                }
                Some(_) => {}
            }
        }

        // Constraint adds.
        if !pk_matches && let Some(pk) = &spec.constraints.primary_key {
            alter
                .add_constraints
                .push(ConstraintAdd::PrimaryKey(pk.clone()));
        }
        for (name, columns) in &expected_unique {
            if !actual_unique_names.contains(name.as_str()) {
                alter.add_constraints.push(ConstraintAdd::Unique {
                    name: name.clone(),
                    columns: (*columns).clone(),
                });
            }
        }
        for (name, columns) in &expected_index {
            if !actual_index_names.contains(name.as_str()) {
                alter.add_constraints.push(ConstraintAdd::Index {
                    name: name.clone(),
                    columns: (*columns).clone(),
                });
            }
        }
        for (name, fk) in &expected_fk {
            if !actual_fk_names.contains(name.as_str()) {
                alter.add_constraints.push(ConstraintAdd::ForeignKey {
                    name: name.clone(),
                    fk: (*fk).clone(),
                });
            }
        }

        alter
    }
}
