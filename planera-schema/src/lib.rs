//! # planera-schema
//!
//! Declarative schema model for Planera.
//!
//! An application describes the tables it expects through a builder API:
//!
//! ```rust
//! use planera_schema::{EntityDescriptor, field};
//!
//! let account = EntityDescriptor::builder("account")
//!     .field(field("uuid").uuid().primary())
//!     .field(field("email").string().max_length(254).unique())
//!     .field(field("first_name").string())
//!     .field(field("last_name").string())
//!     .unique_group(["first_name", "last_name"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(account.table_name(), "accounts");
//! ```
//!
//! Building an [`EntityDescriptor`] normalizes names (snake-case columns,
//! pluralized snake-case table names), classifies each field's physical MySQL
//! type, and aggregates field-level and table-level annotations into a single
//! [`ConstraintSet`]. Invalid declarations (reserved column names, colliding
//! names, unrepresentable numeric bounds) fail at build time, before any
//! database I/O.

pub mod entity;
pub mod error;
pub mod field;
pub mod names;
pub mod table;

pub use entity::{EntityBuilder, EntityDescriptor};
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldBuilder, FieldDescriptor, FieldRole, LogicalType, field};
pub use table::{ColumnShape, ConstraintSet, ForeignKey, TableSpec, normalize_sql_type};
