//! Declarative schema file handling.
//!
//! The shipped binary reads entities from a TOML file; applications that
//! embed the CLI build their descriptors in code instead.

use std::path::Path;

use planera_schema::{EntityDescriptor, FieldBuilder, field};
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Top-level shape of a schema file.
#[derive(Debug, Deserialize)]
pub struct SchemaFile {
    /// Declared entities.
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityEntry>,
}

/// One `[[entity]]` block.
#[derive(Debug, Deserialize)]
pub struct EntityEntry {
    /// Logical entity name.
    pub name: String,
    /// Declared fields.
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
    /// Composite unique groups.
    #[serde(default)]
    pub unique_groups: Vec<Vec<String>>,
    /// Composite index groups.
    #[serde(default)]
    pub index_groups: Vec<Vec<String>>,
}

/// One `[[entity.field]]` block.
#[derive(Debug, Deserialize)]
pub struct FieldEntry {
    /// Logical field name.
    pub name: String,
    /// Logical type.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// String field holds UUIDs.
    #[serde(default)]
    pub uuid: bool,
    /// Maximum string length.
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Integer minimum.
    #[serde(default)]
    pub min: Option<i64>,
    /// Integer maximum.
    #[serde(default)]
    pub max: Option<i64>,
    /// Whether NULL is allowed.
    #[serde(default)]
    pub nullable: bool,
    /// Primary key field.
    #[serde(default)]
    pub primary: bool,
    /// Single-column unique constraint.
    #[serde(default)]
    pub unique: bool,
    /// Single-column index.
    #[serde(default)]
    pub index: bool,
    /// Foreign key field.
    #[serde(default)]
    pub foreign: bool,
    /// Explicit foreign key target.
    #[serde(default)]
    pub references: Option<Reference>,
}

/// Explicit foreign key target.
#[derive(Debug, Deserialize)]
pub struct Reference {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Declared logical types.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    Timestamp,
    Json,
}

impl FieldEntry {
    fn builder(&self) -> FieldBuilder {
        let mut builder = field(&self.name);
        builder = match self.kind {
            FieldKind::String if self.uuid => builder.uuid(),
            FieldKind::String => builder.string(),
            FieldKind::Integer => builder.integer(),
            FieldKind::Boolean => builder.boolean(),
            FieldKind::Timestamp => builder.timestamp(),
            FieldKind::Json => builder.json(),
        };
        if let Some(len) = self.max_length {
            builder = builder.max_length(len);
        }
        if let Some(min) = self.min {
            builder = builder.min_value(min.into());
        }
        if let Some(max) = self.max {
            builder = builder.max_value(max.into());
        }
        if self.nullable {
            builder = builder.nullable();
        }
        if self.primary {
            builder = builder.primary();
        }
        if self.unique {
            builder = builder.unique();
        }
        if self.index {
            builder = builder.index();
        }
        if self.foreign {
            builder = builder.foreign();
        }
        if let Some(reference) = &self.references {
            builder = builder.references(&reference.table, &reference.column);
        }
        builder
    }
}

impl SchemaFile {
    /// Parse a schema file from TOML text.
    pub fn parse(contents: &str) -> CliResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build validated entity descriptors.
    pub fn to_entities(&self) -> CliResult<Vec<EntityDescriptor>> {
        let mut entities = Vec::with_capacity(self.entities.len());
        for entry in &self.entities {
            let mut builder = EntityDescriptor::builder(&entry.name);
            for field_entry in &entry.fields {
                builder = builder.field(field_entry.builder());
            }
            for group in &entry.unique_groups {
                builder = builder.unique_group(group.clone());
            }
            for group in &entry.index_groups {
                builder = builder.index_group(group.clone());
            }
            entities.push(builder.build()?);
        }
        Ok(entities)
    }
}

/// Load entity descriptors from a schema file on disk.
pub fn load_entities(path: &Path) -> CliResult<Vec<EntityDescriptor>> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        CliError::Config(format!("cannot read schema file {}: {}", path.display(), err))
    })?;
    SchemaFile::parse(&contents)?.to_entities()
}
