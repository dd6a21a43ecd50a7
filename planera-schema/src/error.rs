//! Error types for schema declaration.

use thiserror::Error;

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building entity descriptors.
///
/// All of these are declaration errors: they abort planning before any
/// database I/O happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A field uses a reserved column identifier.
    #[error("'{0}' is a reserved column name")]
    ReservedColumnName(String),

    /// Two field names collide after snake-casing.
    #[error("fields '{first}' and '{second}' both map to column '{column}'")]
    ColumnCollision {
        /// First declared field.
        first: String,
        /// Second declared field.
        second: String,
        /// The shared physical column name.
        column: String,
    },

    /// A field was declared without a logical type.
    #[error("field '{0}' has no declared type")]
    MissingType(String),

    /// A numeric bound does not fit any MySQL integer type.
    #[error("numeric bound {bound} on field '{field}' is too large; consider multiple columns")]
    UnrepresentableBound {
        /// Offending field.
        field: String,
        /// The declared bound.
        bound: i128,
    },

    /// Declared minimum exceeds declared maximum.
    #[error("field '{field}' declares min {min} greater than max {max}")]
    InvalidBounds {
        /// Offending field.
        field: String,
        /// Declared minimum.
        min: i128,
        /// Declared maximum.
        max: i128,
    },

    /// More than one field carries the primary role.
    #[error("entity '{entity}' declares multiple primary fields: '{first}' and '{second}'")]
    MultiplePrimaryFields {
        /// Entity name.
        entity: String,
        /// First primary field.
        first: String,
        /// Second primary field.
        second: String,
    },

    /// A composite group references an undeclared field.
    #[error("group on entity '{entity}' references unknown field '{field}'")]
    UnknownGroupField {
        /// Entity name.
        entity: String,
        /// Referenced field.
        field: String,
    },

    /// A foreign field name cannot be split into referenced table and column.
    #[error(
        "cannot derive a foreign key from field '{0}'; name it '<table>_<column>' or declare \
         explicit references"
    )]
    UnderivableForeignKey(String),

    /// A size annotation was applied to a non-string field.
    #[error("max_length is only valid on string fields (field '{0}')")]
    InvalidSizeConstraint(String),

    /// A numeric bound was applied to a non-integer field.
    #[error("numeric bounds are only valid on integer fields (field '{0}')")]
    InvalidNumericBound(String),

    /// Entity declared with no fields.
    #[error("entity '{0}' declares no fields")]
    EmptyEntity(String),
}
