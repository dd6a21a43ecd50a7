//! Name normalization between logical and physical identifiers.

use convert_case::{Case, Casing};
use cruet::Inflector;

/// Column identifiers that MySQL or the planner reserves for itself.
pub const RESERVED_COLUMN_NAMES: &[&str] = &["key", "read"];

/// Convert a logical field or entity name to its physical snake_case form.
pub fn to_column_name(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Convert a logical entity name to its physical table name
/// (snake_case, pluralized).
pub fn to_table_name(entity: &str) -> String {
    entity.to_case(Case::Snake).to_plural()
}

/// Check whether a column identifier is reserved.
pub fn is_reserved(column: &str) -> bool {
    RESERVED_COLUMN_NAMES.contains(&column)
}
