//! Field descriptors and their physical type classification.

use crate::error::{SchemaError, SchemaResult};

/// Logical type of a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    /// Variable-length text, stored as a sized VARCHAR.
    String {
        /// Declared maximum length. Defaults to 128 when absent.
        max_length: Option<u32>,
        /// UUID-valued strings are capped at 36 characters.
        uuid: bool,
    },
    /// Whole number, stored as the narrowest integer type that holds the
    /// declared bounds.
    Integer {
        /// Declared minimum value.
        min: Option<i128>,
        /// Declared maximum value.
        max: Option<i128>,
    },
    /// Boolean flag, stored as a 1-byte integer.
    Boolean,
    /// Point in time, stored with sub-second precision.
    Timestamp,
    /// Structured data, stored as a JSON-capable column.
    Json,
}

/// Constraint role a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Table primary key.
    Primary,
    /// Single-column unique constraint.
    Unique,
    /// Single-column plain index.
    Index,
    /// Foreign key to another table.
    Foreign,
}

/// A single declared field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical field name, as declared.
    pub name: String,
    /// Logical type.
    pub logical_type: LogicalType,
    /// Whether NULL is an allowed value.
    pub nullable: bool,
    /// Constraint role, if any.
    pub role: Option<FieldRole>,
    /// Explicit foreign key target `(table, column)`; when absent, a
    /// [`FieldRole::Foreign`] field derives the target from its own name.
    pub references: Option<(String, String)>,
}

impl FieldDescriptor {
    /// The physical MySQL column type for this field.
    pub fn sql_type(&self) -> SchemaResult<String> {
        match &self.logical_type {
            LogicalType::String { max_length, uuid } => {
                let len = if *uuid { 36 } else { max_length.unwrap_or(128) };
                Ok(format!("VARCHAR({})", len))
            }
            LogicalType::Integer { min, max } => integer_type(&self.name, *min, *max),
            LogicalType::Boolean => Ok("TINYINT(1)".to_string()),
            LogicalType::Timestamp => Ok("DATETIME(3)".to_string()),
            LogicalType::Json => Ok("JSON".to_string()),
        }
    }

    /// The physical default value for this field, if any.
    ///
    /// Nullable columns default to NULL and carry no explicit default.
    /// Non-nullable strings default to the empty string, numbers and
    /// booleans to zero; timestamps and JSON have no representable default.
    pub fn default_value(&self) -> Option<String> {
        if self.nullable {
            return None;
        }
        match self.logical_type {
            LogicalType::String { .. } => Some(String::new()),
            LogicalType::Integer { .. } | LogicalType::Boolean => Some("0".to_string()),
            LogicalType::Timestamp | LogicalType::Json => None,
        }
    }
}

/// Pick the narrowest MySQL integer type that can hold the declared bounds.
///
/// A declared minimum of exactly zero selects the unsigned family. Without a
/// maximum the generic INT is used.
fn integer_type(field: &str, min: Option<i128>, max: Option<i128>) -> SchemaResult<String> {
    let Some(max) = max else {
        return Ok("INT".to_string());
    };
    if let Some(min) = min
        && min > max
    {
        return Err(SchemaError::InvalidBounds {
            field: field.to_string(),
            min,
            max,
        });
    }
    let ty = if min == Some(0) {
        if max <= (1 << 8) - 1 {
            "TINYINT UNSIGNED"
        } else if max <= (1 << 16) - 1 {
            "SMALLINT UNSIGNED"
        } else if max <= (1 << 24) - 1 {
            "MEDIUMINT UNSIGNED"
        } else if max <= (1i128 << 32) - 1 {
            "INT UNSIGNED"
        } else if max <= (1i128 << 64) - 1 {
            "BIGINT UNSIGNED"
        } else {
            return Err(SchemaError::UnrepresentableBound {
                field: field.to_string(),
                bound: max,
            });
        }
    } else if max <= (1 << 7) - 1 {
        "TINYINT"
    } else if max <= (1 << 15) - 1 {
        "SMALLINT"
    } else if max <= (1 << 23) - 1 {
        "MEDIUMINT"
    } else if max <= (1i128 << 31) - 1 {
        "INT"
    } else if max <= (1i128 << 63) - 1 {
        "BIGINT"
    } else {
        return Err(SchemaError::UnrepresentableBound {
            field: field.to_string(),
            bound: max,
        });
    };
    Ok(ty.to_string())
}

/// Start declaring a field.
pub fn field(name: impl Into<String>) -> FieldBuilder {
    FieldBuilder {
        name: name.into(),
        logical_type: None,
        max_length: None,
        min_value: None,
        max_value: None,
        nullable: false,
        role: None,
        references: None,
    }
}

/// Builder for a [`FieldDescriptor`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    logical_type: Option<LogicalType>,
    max_length: Option<u32>,
    min_value: Option<i128>,
    max_value: Option<i128>,
    nullable: bool,
    role: Option<FieldRole>,
    references: Option<(String, String)>,
}

impl FieldBuilder {
    /// Declare a string field.
    pub fn string(mut self) -> Self {
        self.logical_type = Some(LogicalType::String {
            max_length: None,
            uuid: false,
        });
        self
    }

    /// Declare a UUID-valued string field (36-character VARCHAR).
    pub fn uuid(mut self) -> Self {
        self.logical_type = Some(LogicalType::String {
            max_length: None,
            uuid: true,
        });
        self
    }

    /// Declare an integer field.
    pub fn integer(mut self) -> Self {
        self.logical_type = Some(LogicalType::Integer {
            min: None,
            max: None,
        });
        self
    }

    /// Declare a boolean field.
    pub fn boolean(mut self) -> Self {
        self.logical_type = Some(LogicalType::Boolean);
        self
    }

    /// Declare a timestamp field.
    pub fn timestamp(mut self) -> Self {
        self.logical_type = Some(LogicalType::Timestamp);
        self
    }

    /// Declare a structured/JSON field.
    pub fn json(mut self) -> Self {
        self.logical_type = Some(LogicalType::Json);
        self
    }

    /// Cap the string length. Only valid on string fields.
    pub fn max_length(mut self, len: u32) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Declare the minimum integer value. Only valid on integer fields.
    pub fn min_value(mut self, value: i128) -> Self {
        self.min_value = Some(value);
        self
    }

    /// Declare the maximum integer value. Only valid on integer fields.
    pub fn max_value(mut self, value: i128) -> Self {
        self.max_value = Some(value);
        self
    }

    /// Allow NULL values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark this field as the primary key.
    pub fn primary(mut self) -> Self {
        self.role = Some(FieldRole::Primary);
        self
    }

    /// Require this field to be unique.
    pub fn unique(mut self) -> Self {
        self.role = Some(FieldRole::Unique);
        self
    }

    /// Index this field.
    pub fn index(mut self) -> Self {
        self.role = Some(FieldRole::Index);
        self
    }

    /// Mark this field as a foreign key; the target is derived from the
    /// field name (`account_uuid` references `accounts.uuid`) unless
    /// [`references`](Self::references) is also given.
    pub fn foreign(mut self) -> Self {
        self.role = Some(FieldRole::Foreign);
        self
    }

    /// Explicit foreign key target.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.role = Some(FieldRole::Foreign);
        self.references = Some((table.into(), column.into()));
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Finalize the descriptor. Fails when no type was declared or a
    /// modifier does not apply to the declared type.
    pub(crate) fn build(self) -> SchemaResult<FieldDescriptor> {
        let mut logical_type = self
            .logical_type
            .ok_or_else(|| SchemaError::MissingType(self.name.clone()))?;
        match &mut logical_type {
            LogicalType::String { max_length, .. } => {
                if self.min_value.is_some() || self.max_value.is_some() {
                    return Err(SchemaError::InvalidNumericBound(self.name));
                }
                if self.max_length.is_some() {
                    *max_length = self.max_length;
                }
            }
            LogicalType::Integer { min, max } => {
                if self.max_length.is_some() {
                    return Err(SchemaError::InvalidSizeConstraint(self.name));
                }
                *min = self.min_value;
                *max = self.max_value;
            }
            _ => {
                if self.max_length.is_some() {
                    return Err(SchemaError::InvalidSizeConstraint(self.name));
                }
                if self.min_value.is_some() || self.max_value.is_some() {
                    return Err(SchemaError::InvalidNumericBound(self.name));
                }
            }
        }
        Ok(FieldDescriptor {
            name: self.name,
            logical_type,
            nullable: self.nullable,
            role: self.role,
            references: self.references,
        })
    }
}
