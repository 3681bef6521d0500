//! Concrete migration steps.
//!
//! Each step stores its intent at construction and renders through one
//! `Dialect` operation. Constructors attach the step's default condition;
//! [`Migration::with_condition`] replaces it.

use std::collections::BTreeMap;

use crate::core::catalog::normalize_db_type;
use crate::core::schema::{Column, Index, Table};
use crate::core::traits::Dialect;

use super::condition::Condition;
use super::{Migration, MigrationBase};

macro_rules! impl_base {
    () => {
        fn base(&self) -> &MigrationBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut MigrationBase {
            &mut self.base
        }
    };
}

const DEFAULT_KEY: &str = "default";

/// Hand-written SQL, optionally per dialect.
///
/// Resolution: the entry for the dialect's name, then the `"default"`
/// entry, then the dialect's no-op statement. Empty entries are skipped.
/// Stored SQL is never rewritten.
#[derive(Debug, Clone, Default)]
pub struct RawSqlMigration {
    base: MigrationBase,
    sql: BTreeMap<String, String>,
}

impl RawSqlMigration {
    /// A raw step whose `"default"` entry is `sql`.
    pub fn new(sql: impl Into<String>) -> Self {
        Self::empty().default_sql(sql)
    }

    /// A raw step with no entries; renders the no-op until one is set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the SQL for a named backend. Driver-name aliases are accepted.
    pub fn set(mut self, dialect: &str, sql: impl Into<String>) -> Self {
        let key = normalize_db_type(dialect).unwrap_or(dialect);
        self.sql.insert(key.to_string(), sql.into());
        self
    }

    pub fn default_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql.insert(DEFAULT_KEY.to_string(), sql.into());
        self
    }

    pub fn postgres(self, sql: impl Into<String>) -> Self {
        self.set("postgres", sql)
    }

    pub fn mysql(self, sql: impl Into<String>) -> Self {
        self.set("mysql", sql)
    }

    pub fn sqlite(self, sql: impl Into<String>) -> Self {
        self.set("sqlite3", sql)
    }

    pub fn mssql(self, sql: impl Into<String>) -> Self {
        self.set("mssql", sql)
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.sql
            .get(key)
            .map(String::as_str)
            .filter(|sql| !sql.is_empty())
    }
}

impl Migration for RawSqlMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        self.lookup(dialect.name())
            .or_else(|| self.lookup(DEFAULT_KEY))
            .map(str::to_string)
            .unwrap_or_else(|| dialect.no_op_sql())
    }
}

/// Add a column to an existing table. Skipped if the column exists.
#[derive(Debug, Clone)]
pub struct AddColumnMigration {
    base: MigrationBase,
    table_name: String,
    column: Column,
}

impl AddColumnMigration {
    pub fn new(table_name: impl Into<String>, column: Column) -> Self {
        let table_name = table_name.into();
        Self {
            base: MigrationBase::with_condition(Condition::column_not_exists(
                table_name.clone(),
                column.name.clone(),
            )),
            table_name,
            column,
        }
    }
}

impl Migration for AddColumnMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.add_column_sql(&self.table_name, &self.column)
    }
}

/// Create an index. Skipped if an index with the same name exists.
#[derive(Debug, Clone)]
pub struct AddIndexMigration {
    base: MigrationBase,
    table_name: String,
    index: Index,
}

impl AddIndexMigration {
    pub fn new(table_name: impl Into<String>, index: Index) -> Self {
        let table_name = table_name.into();
        Self {
            base: MigrationBase::with_condition(Condition::index_not_exists(
                table_name.clone(),
                index.clone(),
            )),
            table_name,
            index,
        }
    }
}

impl Migration for AddIndexMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.create_index_sql(&self.table_name, &self.index)
    }
}

/// Drop an index. Only runs if the index exists.
///
/// An unnamed index gets its name from the column list here, so the drop
/// targets the identifier [`AddIndexMigration`] created.
#[derive(Debug, Clone)]
pub struct DropIndexMigration {
    base: MigrationBase,
    table_name: String,
    index: Index,
}

impl DropIndexMigration {
    pub fn new(table_name: impl Into<String>, index: Index) -> Self {
        let table_name = table_name.into();
        let index = index.with_backfilled_name();
        Self {
            base: MigrationBase::with_condition(Condition::index_exists(
                table_name.clone(),
                index.clone(),
            )),
            table_name,
            index,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

impl Migration for DropIndexMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.drop_index_sql(&self.table_name, &self.index)
    }
}

/// Create a table.
///
/// Primary keys and uniques are re-derived from the column flags when the
/// step is built and kept as a snapshot.
#[derive(Debug, Clone)]
pub struct AddTableMigration {
    base: MigrationBase,
    table: Table,
}

impl AddTableMigration {
    pub fn new(table: Table) -> Self {
        Self {
            base: MigrationBase::default(),
            table: Table::new(table.name, table.columns),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Migration for AddTableMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.create_table_sql(&self.table)
    }
}

#[derive(Debug, Clone)]
pub struct DropTableMigration {
    base: MigrationBase,
    table_name: String,
}

impl DropTableMigration {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            base: MigrationBase::default(),
            table_name: table_name.into(),
        }
    }
}

impl Migration for DropTableMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.drop_table_sql(&self.table_name)
    }
}

#[derive(Debug, Clone)]
pub struct RenameTableMigration {
    base: MigrationBase,
    old_name: String,
    new_name: String,
}

impl RenameTableMigration {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            base: MigrationBase::default(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }
}

impl Migration for RenameTableMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.rename_table_sql(&self.old_name, &self.new_name)
    }
}

#[derive(Debug, Clone)]
pub struct RenameColumnMigration {
    base: MigrationBase,
    table_name: String,
    old_name: String,
    new_name: String,
}

impl RenameColumnMigration {
    pub fn new(
        table_name: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            base: MigrationBase::default(),
            table_name: table_name.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }
}

impl Migration for RenameColumnMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.rename_column_sql(&self.table_name, &self.old_name, &self.new_name)
    }
}

/// Drop a column. Only runs if the column exists.
#[derive(Debug, Clone)]
pub struct RemoveColumnMigration {
    base: MigrationBase,
    table_name: String,
    column_name: String,
}

impl RemoveColumnMigration {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let column_name = column_name.into();
        Self {
            base: MigrationBase::with_condition(Condition::column_exists(
                table_name.clone(),
                column_name.clone(),
            )),
            table_name,
            column_name,
        }
    }
}

impl Migration for RemoveColumnMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.drop_column_sql(&self.table_name, &self.column_name)
    }
}

/// Copy rows between tables, mapping columns by name.
#[derive(Debug, Clone)]
pub struct CopyTableDataMigration {
    base: MigrationBase,
    source_table: String,
    target_table: String,
    /// (target column, source column), in insertion order.
    columns: Vec<(String, String)>,
}

impl CopyTableDataMigration {
    pub fn new<I, T, S>(
        target_table: impl Into<String>,
        source_table: impl Into<String>,
        column_map: I,
    ) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            base: MigrationBase::default(),
            source_table: source_table.into(),
            target_table: target_table.into(),
            columns: column_map
                .into_iter()
                .map(|(t, s)| (t.into(), s.into()))
                .collect(),
        }
    }
}

impl Migration for CopyTableDataMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        let (target_cols, source_cols): (Vec<String>, Vec<String>) =
            self.columns.iter().cloned().unzip();
        dialect.copy_table_data_sql(
            &self.source_table,
            &self.target_table,
            &source_cols,
            &target_cols,
        )
    }
}

/// Re-declare column types in bulk, e.g. to move text columns to a new
/// charset.
#[derive(Debug, Clone)]
pub struct TableCharsetMigration {
    base: MigrationBase,
    table_name: String,
    columns: Vec<Column>,
}

impl TableCharsetMigration {
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            base: MigrationBase::default(),
            table_name: table_name.into(),
            columns,
        }
    }
}

impl Migration for TableCharsetMigration {
    impl_base!();

    fn sql(&self, dialect: &dyn Dialect) -> String {
        dialect.update_table_sql(&self.table_name, &self.columns)
    }
}
