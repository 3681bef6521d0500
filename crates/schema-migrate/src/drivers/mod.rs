//! Database driver implementations.
//!
//! - [`postgres`]: PostgreSQL dialect and connection
//! - [`mysql`]: MySQL/MariaDB dialect, connection behind the `mysql` feature
//! - [`sqlite`]: SQLite dialect, connection behind the `sqlite` feature
//! - [`mssql`]: Microsoft SQL Server dialect and connection
//!
//! # Static dispatch
//!
//! The supported backends are a closed set, so [`DialectImpl`] is an enum
//! with one variant per dialect rather than a `Box<dyn Dialect>` registry.
//! Adding a method to [`Dialect`] forces every arm here to be updated.
//!
//! # Adding New Databases
//!
//! 1. Create a module under `drivers/` with a `Dialect` implementation
//! 2. Add the variant and its driver-name aliases to `DialectImpl`
//! 3. Add a `SchemaConnection` adapter and wire it in `core::catalog::open_session`
//! 4. Gate the connection with a feature flag in `Cargo.toml`

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mssql::{MssqlConnection, MssqlDialect};
#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;
pub use mysql::MysqlDialect;
pub use postgres::{PostgresConnection, PostgresDialect};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
pub use sqlite::SqliteDialect;

use crate::core::catalog::normalize_db_type;
use crate::core::schema::{Column, Index, Table};
use crate::core::traits::{AutoIncrKey, CheckQuery, CleanPlan, Dialect, ErrorClass, ErrorCodes};
use crate::error::{DbError, MigrateError, Result};

/// Enum-based static dispatch for dialects.
///
/// Note: every `Dialect` method is matched per arm, including those with
/// default bodies, so per-dialect overrides are never bypassed and no call
/// goes through a vtable.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Postgres(PostgresDialect),
    Mysql(MysqlDialect),
    Sqlite(SqliteDialect),
    Mssql(MssqlDialect),
}

impl DialectImpl {
    /// Select the dialect for a driver name, accepting the usual aliases.
    pub fn from_driver_name(name: &str) -> Result<Self> {
        match normalize_db_type(name) {
            Some("postgres") => Ok(DialectImpl::Postgres(PostgresDialect::new())),
            Some("mysql") => Ok(DialectImpl::Mysql(MysqlDialect::new())),
            Some("sqlite3") => Ok(DialectImpl::Sqlite(SqliteDialect::new())),
            Some("mssql") => Ok(DialectImpl::Mssql(MssqlDialect::new())),
            _ => Err(MigrateError::UnsupportedDialect(name.to_string())),
        }
    }

    /// Every supported dialect, in a stable order.
    pub fn all() -> [DialectImpl; 4] {
        [
            DialectImpl::Postgres(PostgresDialect::new()),
            DialectImpl::Mysql(MysqlDialect::new()),
            DialectImpl::Sqlite(SqliteDialect::new()),
            DialectImpl::Mssql(MssqlDialect::new()),
        ]
    }
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.name(),
            DialectImpl::Mysql(d) => d.name(),
            DialectImpl::Sqlite(d) => d.name(),
            DialectImpl::Mssql(d) => d.name(),
        }
    }

    fn quote(&self, name: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.quote(name),
            DialectImpl::Mysql(d) => d.quote(name),
            DialectImpl::Sqlite(d) => d.quote(name),
            DialectImpl::Mssql(d) => d.quote(name),
        }
    }

    fn like_str(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.like_str(),
            DialectImpl::Mysql(d) => d.like_str(),
            DialectImpl::Sqlite(d) => d.like_str(),
            DialectImpl::Mssql(d) => d.like_str(),
        }
    }

    fn auto_incr_str(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.auto_incr_str(),
            DialectImpl::Mysql(d) => d.auto_incr_str(),
            DialectImpl::Sqlite(d) => d.auto_incr_str(),
            DialectImpl::Mssql(d) => d.auto_incr_str(),
        }
    }

    fn boolean_str(&self, value: bool) -> String {
        match self {
            DialectImpl::Postgres(d) => d.boolean_str(value),
            DialectImpl::Mysql(d) => d.boolean_str(value),
            DialectImpl::Sqlite(d) => d.boolean_str(value),
            DialectImpl::Mssql(d) => d.boolean_str(value),
        }
    }

    fn param_placeholder(&self, index: usize) -> String {
        match self {
            DialectImpl::Postgres(d) => d.param_placeholder(index),
            DialectImpl::Mysql(d) => d.param_placeholder(index),
            DialectImpl::Sqlite(d) => d.param_placeholder(index),
            DialectImpl::Mssql(d) => d.param_placeholder(index),
        }
    }

    fn string_literal(&self, value: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.string_literal(value),
            DialectImpl::Mysql(d) => d.string_literal(value),
            DialectImpl::Sqlite(d) => d.string_literal(value),
            DialectImpl::Mssql(d) => d.string_literal(value),
        }
    }

    fn default_value(&self, col: &Column) -> String {
        match self {
            DialectImpl::Postgres(d) => d.default_value(col),
            DialectImpl::Mysql(d) => d.default_value(col),
            DialectImpl::Sqlite(d) => d.default_value(col),
            DialectImpl::Mssql(d) => d.default_value(col),
        }
    }

    fn sql_type(&self, col: &Column) -> String {
        match self {
            DialectImpl::Postgres(d) => d.sql_type(col),
            DialectImpl::Mysql(d) => d.sql_type(col),
            DialectImpl::Sqlite(d) => d.sql_type(col),
            DialectImpl::Mssql(d) => d.sql_type(col),
        }
    }

    fn column_type_sql(&self, col: &Column) -> String {
        match self {
            DialectImpl::Postgres(d) => d.column_type_sql(col),
            DialectImpl::Mysql(d) => d.column_type_sql(col),
            DialectImpl::Sqlite(d) => d.column_type_sql(col),
            DialectImpl::Mssql(d) => d.column_type_sql(col),
        }
    }

    fn auto_incr_key(&self) -> AutoIncrKey {
        match self {
            DialectImpl::Postgres(d) => d.auto_incr_key(),
            DialectImpl::Mysql(d) => d.auto_incr_key(),
            DialectImpl::Sqlite(d) => d.auto_incr_key(),
            DialectImpl::Mssql(d) => d.auto_incr_key(),
        }
    }

    fn normalize_column(&self, col: &Column) -> Column {
        match self {
            DialectImpl::Postgres(d) => d.normalize_column(col),
            DialectImpl::Mysql(d) => d.normalize_column(col),
            DialectImpl::Sqlite(d) => d.normalize_column(col),
            DialectImpl::Mssql(d) => d.normalize_column(col),
        }
    }

    fn column_sql(&self, col: &Column, inline_pk: bool) -> String {
        match self {
            DialectImpl::Postgres(d) => d.column_sql(col, inline_pk),
            DialectImpl::Mysql(d) => d.column_sql(col, inline_pk),
            DialectImpl::Sqlite(d) => d.column_sql(col, inline_pk),
            DialectImpl::Mssql(d) => d.column_sql(col, inline_pk),
        }
    }

    fn create_table_prefix(&self, table: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.create_table_prefix(table),
            DialectImpl::Mysql(d) => d.create_table_prefix(table),
            DialectImpl::Sqlite(d) => d.create_table_prefix(table),
            DialectImpl::Mssql(d) => d.create_table_prefix(table),
        }
    }

    fn create_table_suffix(&self) -> String {
        match self {
            DialectImpl::Postgres(d) => d.create_table_suffix(),
            DialectImpl::Mysql(d) => d.create_table_suffix(),
            DialectImpl::Sqlite(d) => d.create_table_suffix(),
            DialectImpl::Mssql(d) => d.create_table_suffix(),
        }
    }

    fn create_table_sql(&self, table: &Table) -> String {
        match self {
            DialectImpl::Postgres(d) => d.create_table_sql(table),
            DialectImpl::Mysql(d) => d.create_table_sql(table),
            DialectImpl::Sqlite(d) => d.create_table_sql(table),
            DialectImpl::Mssql(d) => d.create_table_sql(table),
        }
    }

    fn drop_table_sql(&self, table: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.drop_table_sql(table),
            DialectImpl::Mysql(d) => d.drop_table_sql(table),
            DialectImpl::Sqlite(d) => d.drop_table_sql(table),
            DialectImpl::Mssql(d) => d.drop_table_sql(table),
        }
    }

    fn add_column_sql(&self, table: &str, col: &Column) -> String {
        match self {
            DialectImpl::Postgres(d) => d.add_column_sql(table, col),
            DialectImpl::Mysql(d) => d.add_column_sql(table, col),
            DialectImpl::Sqlite(d) => d.add_column_sql(table, col),
            DialectImpl::Mssql(d) => d.add_column_sql(table, col),
        }
    }

    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.drop_column_sql(table, column),
            DialectImpl::Mysql(d) => d.drop_column_sql(table, column),
            DialectImpl::Sqlite(d) => d.drop_column_sql(table, column),
            DialectImpl::Mssql(d) => d.drop_column_sql(table, column),
        }
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        match self {
            DialectImpl::Postgres(d) => d.create_index_sql(table, index),
            DialectImpl::Mysql(d) => d.create_index_sql(table, index),
            DialectImpl::Sqlite(d) => d.create_index_sql(table, index),
            DialectImpl::Mssql(d) => d.create_index_sql(table, index),
        }
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        match self {
            DialectImpl::Postgres(d) => d.drop_index_sql(table, index),
            DialectImpl::Mysql(d) => d.drop_index_sql(table, index),
            DialectImpl::Sqlite(d) => d.drop_index_sql(table, index),
            DialectImpl::Mssql(d) => d.drop_index_sql(table, index),
        }
    }

    fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.rename_table_sql(old_name, new_name),
            DialectImpl::Mysql(d) => d.rename_table_sql(old_name, new_name),
            DialectImpl::Sqlite(d) => d.rename_table_sql(old_name, new_name),
            DialectImpl::Mssql(d) => d.rename_table_sql(old_name, new_name),
        }
    }

    fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.rename_column_sql(table, old_name, new_name),
            DialectImpl::Mysql(d) => d.rename_column_sql(table, old_name, new_name),
            DialectImpl::Sqlite(d) => d.rename_column_sql(table, old_name, new_name),
            DialectImpl::Mssql(d) => d.rename_column_sql(table, old_name, new_name),
        }
    }

    fn copy_table_data_sql(
        &self,
        source_table: &str,
        target_table: &str,
        source_cols: &[String],
        target_cols: &[String],
    ) -> String {
        match self {
            DialectImpl::Postgres(d) => {
                d.copy_table_data_sql(source_table, target_table, source_cols, target_cols)
            }
            DialectImpl::Mysql(d) => {
                d.copy_table_data_sql(source_table, target_table, source_cols, target_cols)
            }
            DialectImpl::Sqlite(d) => {
                d.copy_table_data_sql(source_table, target_table, source_cols, target_cols)
            }
            DialectImpl::Mssql(d) => {
                d.copy_table_data_sql(source_table, target_table, source_cols, target_cols)
            }
        }
    }

    fn update_table_sql(&self, table: &str, columns: &[Column]) -> String {
        match self {
            DialectImpl::Postgres(d) => d.update_table_sql(table, columns),
            DialectImpl::Mysql(d) => d.update_table_sql(table, columns),
            DialectImpl::Sqlite(d) => d.update_table_sql(table, columns),
            DialectImpl::Mssql(d) => d.update_table_sql(table, columns),
        }
    }

    fn no_op_sql(&self) -> String {
        match self {
            DialectImpl::Postgres(d) => d.no_op_sql(),
            DialectImpl::Mysql(d) => d.no_op_sql(),
            DialectImpl::Sqlite(d) => d.no_op_sql(),
            DialectImpl::Mssql(d) => d.no_op_sql(),
        }
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery {
        match self {
            DialectImpl::Postgres(d) => d.index_check_sql(table, index_name),
            DialectImpl::Mysql(d) => d.index_check_sql(table, index_name),
            DialectImpl::Sqlite(d) => d.index_check_sql(table, index_name),
            DialectImpl::Mssql(d) => d.index_check_sql(table, index_name),
        }
    }

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery {
        match self {
            DialectImpl::Postgres(d) => d.column_check_sql(table, column),
            DialectImpl::Mysql(d) => d.column_check_sql(table, column),
            DialectImpl::Sqlite(d) => d.column_check_sql(table, column),
            DialectImpl::Mssql(d) => d.column_check_sql(table, column),
        }
    }

    fn table_check_sql(&self, table: &str) -> CheckQuery {
        match self {
            DialectImpl::Postgres(d) => d.table_check_sql(table),
            DialectImpl::Mysql(d) => d.table_check_sql(table),
            DialectImpl::Sqlite(d) => d.table_check_sql(table),
            DialectImpl::Mssql(d) => d.table_check_sql(table),
        }
    }

    fn error_codes(&self) -> ErrorCodes {
        match self {
            DialectImpl::Postgres(d) => d.error_codes(),
            DialectImpl::Mysql(d) => d.error_codes(),
            DialectImpl::Sqlite(d) => d.error_codes(),
            DialectImpl::Mssql(d) => d.error_codes(),
        }
    }

    fn classify_error(&self, err: &DbError) -> Option<ErrorClass> {
        match self {
            DialectImpl::Postgres(d) => d.classify_error(err),
            DialectImpl::Mysql(d) => d.classify_error(err),
            DialectImpl::Sqlite(d) => d.classify_error(err),
            DialectImpl::Mssql(d) => d.classify_error(err),
        }
    }

    fn is_unique_constraint_violation(&self, err: &DbError) -> bool {
        match self {
            DialectImpl::Postgres(d) => d.is_unique_constraint_violation(err),
            DialectImpl::Mysql(d) => d.is_unique_constraint_violation(err),
            DialectImpl::Sqlite(d) => d.is_unique_constraint_violation(err),
            DialectImpl::Mssql(d) => d.is_unique_constraint_violation(err),
        }
    }

    fn is_deadlock(&self, err: &DbError) -> bool {
        match self {
            DialectImpl::Postgres(d) => d.is_deadlock(err),
            DialectImpl::Mysql(d) => d.is_deadlock(err),
            DialectImpl::Sqlite(d) => d.is_deadlock(err),
            DialectImpl::Mssql(d) => d.is_deadlock(err),
        }
    }

    fn clean_db_plan(&self) -> CleanPlan {
        match self {
            DialectImpl::Postgres(d) => d.clean_db_plan(),
            DialectImpl::Mysql(d) => d.clean_db_plan(),
            DialectImpl::Sqlite(d) => d.clean_db_plan(),
            DialectImpl::Mssql(d) => d.clean_db_plan(),
        }
    }
}
