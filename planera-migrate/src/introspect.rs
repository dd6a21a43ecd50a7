//! Live database introspection.
//!
//! Reads `information_schema` to reconstruct the actual shape of every
//! base table in the session's database: columns, primary key, secondary
//! indexes, and foreign keys.

use std::collections::{BTreeMap, HashSet};

use planera_mysql::MysqlSession;
use planera_schema::ColumnShape;
use tracing::debug;

use crate::error::MigrateResult;

/// Actual shape of one table, as observed in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    /// Table name.
    pub name: String,
    /// Columns in ordinal position order.
    pub columns: Vec<ColumnShape>,
    /// Primary key columns, in key order.
    pub primary_key: Vec<String>,
    /// Unique indexes (excluding the primary key).
    pub unique_indexes: Vec<IndexState>,
    /// Non-unique indexes, excluding those backing foreign keys.
    pub plain_indexes: Vec<IndexState>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyState>,
}

/// One secondary index as observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexState {
    /// Index name.
    pub name: String,
    /// Columns in key order.
    pub columns: Vec<String>,
}

/// One foreign key as observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyState {
    /// Constraint name.
    pub name: String,
    /// Local column.
    pub column: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
}

/// Reads table state from `information_schema`.
pub struct MysqlIntrospector {
    session: MysqlSession,
}

impl MysqlIntrospector {
    /// Create an introspector over an open session.
    pub fn new(session: MysqlSession) -> Self {
        Self { session }
    }

    /// Introspect every base table in the session's database.
    ///
    /// Tables are returned sorted by name. Indexes that only exist to back
    /// a foreign key (their name equals the constraint name) are filtered
    /// out so they do not register as drift.
    pub async fn tables(&self) -> MigrateResult<Vec<TableState>> {
        let database = self.session.database().to_string();
        debug!(database = %database, "Introspecting database");

        let mut states: BTreeMap<String, TableState> = BTreeMap::new();
        let names: Vec<String> = self
            .session
            .query_params(
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'",
                (database.clone(),),
            )
            .await?;
        for name in names {
            states.insert(
                name.clone(),
                TableState {
                    name,
                    ..Default::default()
                },
            );
        }

        self.load_columns(&database, &mut states).await?;
        let fk_names = self.load_foreign_keys(&database, &mut states).await?;
        self.load_indexes(&database, &fk_names, &mut states).await?;

        Ok(states.into_values().collect())
    }

    async fn load_columns(
        &self,
        database: &str,
        states: &mut BTreeMap<String, TableState>,
    ) -> MigrateResult<()> {
        let rows: Vec<(String, String, String, String, Option<String>)> = self
            .session
            .query_params(
                "SELECT TABLE_NAME, COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT \
                 FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = ? \
                 ORDER BY TABLE_NAME, ORDINAL_POSITION",
                (database.to_string(),),
            )
            .await?;

        for (table, column, sql_type, is_nullable, default) in rows {
            if let Some(state) = states.get_mut(&table) {
                state.columns.push(ColumnShape {
                    name: column,
                    sql_type,
                    nullable: is_nullable == "YES",
                    default,
                });
            }
        }
        Ok(())
    }

    async fn load_foreign_keys(
        &self,
        database: &str,
        states: &mut BTreeMap<String, TableState>,
    ) -> MigrateResult<HashSet<String>> {
        let rows: Vec<(String, String, String, String, String)> = self
            .session
            .query_params(
                "SELECT TABLE_NAME, CONSTRAINT_NAME, COLUMN_NAME, \
                        REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
                 FROM information_schema.KEY_COLUMN_USAGE \
                 WHERE TABLE_SCHEMA = ? AND REFERENCED_TABLE_NAME IS NOT NULL \
                 ORDER BY TABLE_NAME, CONSTRAINT_NAME",
                (database.to_string(),),
            )
            .await?;

        let mut fk_names = HashSet::new();
        for (table, name, column, referenced_table, referenced_column) in rows {
            fk_names.insert(name.clone());
            if let Some(state) = states.get_mut(&table) {
                state.foreign_keys.push(ForeignKeyState {
                    name,
                    column,
                    referenced_table,
                    referenced_column,
                });
            }
        }
        Ok(fk_names)
    }

    async fn load_indexes(
        &self,
        database: &str,
        fk_names: &HashSet<String>,
        states: &mut BTreeMap<String, TableState>,
    ) -> MigrateResult<()> {
        let rows: Vec<(String, String, i64, String)> = self
            .session
            .query_params(
                "SELECT TABLE_NAME, INDEX_NAME, NON_UNIQUE, COLUMN_NAME \
                 FROM information_schema.STATISTICS \
                 WHERE TABLE_SCHEMA = ? \
                 ORDER BY TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX",
                (database.to_string(),),
            )
            .await?;

        distribute_indexes(group_index_rows(rows), fk_names, states);
        Ok(())
    }
}

/// Group STATISTICS rows (already ordered by SEQ_IN_INDEX) into
/// `(table, index) -> (non_unique, columns in key order)`.
fn group_index_rows(
    rows: Vec<(String, String, i64, String)>,
) -> BTreeMap<(String, String), (bool, Vec<String>)> {
    let mut grouped: BTreeMap<(String, String), (bool, Vec<String>)> = BTreeMap::new();
    for (table, index, non_unique, column) in rows {
        grouped
            .entry((table, index))
            .or_insert_with(|| (non_unique != 0, Vec::new()))
            .1
            .push(column);
    }
    grouped
}

/// Route grouped indexes onto their table states: `PRIMARY` becomes the
/// primary key, indexes backing a foreign key are skipped, the rest split
/// into unique and plain by NON_UNIQUE.
fn distribute_indexes(
    grouped: BTreeMap<(String, String), (bool, Vec<String>)>,
    fk_names: &HashSet<String>,
    states: &mut BTreeMap<String, TableState>,
) {
    for ((table, index), (non_unique, columns)) in grouped {
        let Some(state) = states.get_mut(&table) else {
            continue;
        };
        if index == "PRIMARY" {
            state.primary_key = columns;
            continue;
        }
        // An index MySQL created to back a foreign key is not drift.
        if fk_names.contains(&index) {
            continue;
        }
        let entry = IndexState {
            name: index,
            columns,
        };
        if non_unique {
            state.plain_indexes.push(entry);
        } else {
            state.unique_indexes.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn row(table: &str, index: &str, non_unique: i64, column: &str) -> (String, String, i64, String) {
        (
            table.to_string(),
            index.to_string(),
            non_unique,
            column.to_string(),
        )
    }

    fn states_for(tables: &[&str]) -> BTreeMap<String, TableState> {
        tables
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    TableState {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_index_rows_group_in_key_order() {
        let grouped = group_index_rows(vec![
            row("accounts", "UC_accounts_first_name_last_name", 0, "first_name"),
            row("accounts", "UC_accounts_first_name_last_name", 0, "last_name"),
            row("accounts", "IX_created_at", 1, "created_at"),
        ]);

        assert_eq!(grouped.len(), 2);
        let (non_unique, columns) = &grouped[&(
            "accounts".to_string(),
            "UC_accounts_first_name_last_name".to_string(),
        )];
        assert!(!non_unique);
        assert_eq!(
            columns,
            &vec!["first_name".to_string(), "last_name".to_string()]
        );
    }

    #[test]
    fn test_primary_index_becomes_primary_key() {
        let mut states = states_for(&["accounts"]);
        let grouped = group_index_rows(vec![row("accounts", "PRIMARY", 0, "uuid")]);

        distribute_indexes(grouped, &HashSet::new(), &mut states);

        let state = &states["accounts"];
        assert_eq!(state.primary_key, vec!["uuid".to_string()]);
        assert!(state.unique_indexes.is_empty());
    }

    #[test]
    fn test_foreign_key_backing_index_is_skipped() {
        let mut states = states_for(&["posts"]);
        let fk = "FK_posts_account_uuid_accounts_uuid".to_string();
        let grouped = group_index_rows(vec![
            row("posts", &fk, 1, "account_uuid"),
            row("posts", "IX_created_at", 1, "created_at"),
        ]);

        distribute_indexes(grouped, &HashSet::from([fk]), &mut states);

        let state = &states["posts"];
        assert_eq!(state.plain_indexes.len(), 1);
        assert_eq!(state.plain_indexes[0].name, "IX_created_at");
    }

    #[test]
    fn test_indexes_split_by_uniqueness() {
        let mut states = states_for(&["posts"]);
        let grouped = group_index_rows(vec![
            row("posts", "UC_posts_slug", 0, "slug"),
            row("posts", "IX_created_at", 1, "created_at"),
        ]);

        distribute_indexes(grouped, &HashSet::new(), &mut states);

        let state = &states["posts"];
        assert_eq!(state.unique_indexes[0].name, "UC_posts_slug");
        assert_eq!(state.plain_indexes[0].name, "IX_created_at");
    }
}
