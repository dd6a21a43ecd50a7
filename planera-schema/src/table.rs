//! Physical table shapes: columns and constraints.

use serde::{Deserialize, Serialize};

/// Physical column definition, either expected (from a descriptor) or
/// actual (introspected from the database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnShape {
    /// Physical column name.
    pub name: String,
    /// MySQL column type, e.g. `VARCHAR(36)` or `INT UNSIGNED`.
    pub sql_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value; `Some("")` renders as `DEFAULT ""`.
    pub default: Option<String>,
}

impl ColumnShape {
    /// Two shapes are equivalent when their normalized types, nullability,
    /// and defaults all match.
    ///
    /// Integer display widths (`int(11)` vs `INT`) are ignored: MySQL
    /// reports them inconsistently across versions and they carry no
    /// storage semantics.
    pub fn equivalent(&self, other: &ColumnShape) -> bool {
        normalize_sql_type(&self.sql_type) == normalize_sql_type(&other.sql_type)
            && self.nullable == other.nullable
            && self.default == other.default
    }
}

/// Normalize a MySQL column type for comparison: uppercase, with display
/// widths stripped from the integer families.
pub fn normalize_sql_type(sql_type: &str) -> String {
    let upper = sql_type.trim().to_uppercase();
    const INTEGER_FAMILIES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"];
    if let Some(open) = upper.find('(') {
        let base = &upper[..open];
        if INTEGER_FAMILIES.contains(&base)
            && let Some(close) = upper.find(')')
        {
            let suffix = upper[close + 1..].trim();
            return if suffix.is_empty() {
                base.to_string()
            } else {
                format!("{} {}", base, suffix)
            };
        }
    }
    upper
}

/// A foreign key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column.
    pub column: String,
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub referenced_column: String,
}

/// Aggregated constraint declarations for one table.
///
/// Ordering within each group is significant: composite key column order
/// is part of the constraint's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Primary key column, if any.
    pub primary_key: Option<String>,
    /// Unique constraints; field-level annotations come first, then
    /// table-level composite groups, each in declaration order.
    pub unique_groups: Vec<Vec<String>>,
    /// Plain indexes, same ordering rules as unique groups.
    pub index_groups: Vec<Vec<String>>,
    /// Foreign keys, in declaration order.
    pub foreign_keys: Vec<ForeignKey>,
}

impl ConstraintSet {
    /// Whether no constraints are declared.
    pub fn is_empty(&self) -> bool {
        self.primary_key.is_none()
            && self.unique_groups.is_empty()
            && self.index_groups.is_empty()
            && self.foreign_keys.is_empty()
    }
}

/// Fully resolved expected shape of one physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Physical table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnShape>,
    /// Constraint declarations.
    pub constraints: ConstraintSet,
}

impl TableSpec {
    /// Look up a column by physical name.
    pub fn column(&self, name: &str) -> Option<&ColumnShape> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(sql_type: &str, nullable: bool, default: Option<&str>) -> ColumnShape {
        ColumnShape {
            name: "c".to_string(),
            sql_type: sql_type.to_string(),
            nullable,
            default: default.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_normalize_strips_integer_widths() {
        assert_eq!(normalize_sql_type("int(11)"), "INT");
        assert_eq!(normalize_sql_type("tinyint(1)"), "TINYINT");
        assert_eq!(normalize_sql_type("bigint(20) unsigned"), "BIGINT UNSIGNED");
    }

    #[test]
    fn test_normalize_keeps_varchar_length() {
        assert_eq!(normalize_sql_type("varchar(36)"), "VARCHAR(36)");
        assert_eq!(normalize_sql_type("VARCHAR(128)"), "VARCHAR(128)");
    }

    #[test]
    fn test_equivalent_ignores_case_and_width() {
        assert!(shape("INT", false, Some("0")).equivalent(&shape("int(11)", false, Some("0"))));
        assert!(shape("VARCHAR(36)", false, Some("")).equivalent(&shape(
            "varchar(36)",
            false,
            Some("")
        )));
    }

    #[test]
    fn test_equivalent_detects_mismatches() {
        // type
        assert!(!shape("VARCHAR(36)", false, None).equivalent(&shape("VARCHAR(64)", false, None)));
        // nullability
        assert!(!shape("INT", true, None).equivalent(&shape("INT", false, None)));
        // default
        assert!(!shape("INT", false, Some("0")).equivalent(&shape("INT", false, None)));
    }

    #[test]
    fn test_constraint_set_is_empty() {
        assert!(ConstraintSet::default().is_empty());
        let set = ConstraintSet {
            primary_key: Some("uuid".to_string()),
            ..Default::default()
        };
        assert!(!set.is_empty());
    }
}
