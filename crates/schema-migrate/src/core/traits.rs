//! Core traits for dialect-aware schema migration.
//!
//! - [`Dialect`]: renders schema intents as native SQL and classifies errors
//! - [`SchemaConnection`]: the live database seam used for execution and
//!   catalog queries
//!
//! # Design Patterns
//!
//! - **Strategy**: one `Dialect` per backend, selected by driver name
//! - **Template Method**: default `Dialect` methods assemble statements from
//!   the small per-dialect hooks (`quote`, `sql_type`, prefixes); dialects
//!   override only where their syntax differs

use async_trait::async_trait;

use crate::error::DbError;

use super::identifier;
use super::schema::{Column, ColumnType, Index, IndexKind, Table};

/// Classification of a driver error by native code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    UniqueViolation,
    Deadlock,
}

/// Native error codes a dialect maps onto [`ErrorClass`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodes {
    pub unique_violation: &'static [&'static str],
    pub deadlock: &'static [&'static str],
}

impl ErrorCodes {
    pub fn classify(&self, code: &str) -> Option<ErrorClass> {
        if self.unique_violation.contains(&code) {
            Some(ErrorClass::UniqueViolation)
        } else if self.deadlock.contains(&code) {
            Some(ErrorClass::Deadlock)
        } else {
            None
        }
    }
}

/// How a dialect resets a database to an empty schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanPlan {
    /// Run each statement in order, stopping at the first failure.
    Statements(Vec<String>),
    /// List user tables with `list_sql` (first column is the table name),
    /// then run `before`, one drop per table, then `after`.
    DropTables {
        list_sql: String,
        before: Vec<String>,
        after: Vec<String>,
    },
}

/// Extra key an auto-increment column needs when it is not the table's
/// sole primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrKey {
    /// The column is valid unkeyed (sequences, IDENTITY).
    None,
    /// The column must lead some index; a `UNIQUE` key is added for it.
    Unique,
    /// The column must be the primary key; declared key columns are kept
    /// as a `UNIQUE` constraint instead.
    PrimaryKey,
}

/// A parameterized catalog query: SQL plus positional string parameters.
pub type CheckQuery = (String, Vec<String>);

/// SQL dialect for one database backend.
///
/// Implementations are stateless and cheap to clone; they own no step data
/// and no connection.
pub trait Dialect: Send + Sync {
    /// Canonical driver name ("postgres", "mysql", "sqlite3", "mssql").
    fn name(&self) -> &str;

    /// Quote an identifier. Already-quoted names are returned unchanged and
    /// case is preserved.
    fn quote(&self, name: &str) -> String;

    /// LIKE operator for case-insensitive search predicates.
    fn like_str(&self) -> &str {
        "LIKE"
    }

    /// Token declaring an auto-increment column; empty when the column type
    /// carries it.
    fn auto_incr_str(&self) -> &str;

    /// Boolean literal.
    fn boolean_str(&self, value: bool) -> String {
        let literal = if value { "1" } else { "0" };
        literal.to_string()
    }

    /// Positional parameter placeholder (1-based).
    fn param_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Quote a string value as a SQL literal.
    fn string_literal(&self, value: &str) -> String {
        identifier::string_literal(value)
    }

    /// Render a column's default expression.
    ///
    /// Boolean columns map `"0"` to the false literal and anything else to
    /// the true literal. Other types pass the raw default through.
    fn default_value(&self, col: &Column) -> String {
        let raw = col.default.as_deref().unwrap_or_default();
        if col.column_type == ColumnType::Bool {
            return self.boolean_str(raw != "0");
        }
        raw.to_string()
    }

    /// Native type for a column, including any size parameters.
    ///
    /// Pure: reads the column as given. Callers that need type-implied flags
    /// go through [`Dialect::normalize_column`] first.
    fn sql_type(&self, col: &Column) -> String;

    /// Copy of `col` with the flags its type implies in this dialect.
    fn normalize_column(&self, col: &Column) -> Column {
        col.normalized()
    }

    /// Type as written in a column definition. Defaults to [`Dialect::sql_type`];
    /// dialects append per-column attributes such as a character set here so
    /// `sql_type` stays a bare type name.
    fn column_type_sql(&self, col: &Column) -> String {
        self.sql_type(col)
    }

    /// Key an auto-increment column needs outside the inline primary key.
    fn auto_incr_key(&self) -> AutoIncrKey {
        AutoIncrKey::None
    }

    /// One column definition.
    ///
    /// With `inline_pk`, a primary-key column renders `PRIMARY KEY`. The
    /// auto-increment token follows every auto-increment column.
    fn column_sql(&self, col: &Column, inline_pk: bool) -> String {
        let col = self.normalize_column(col);
        let mut parts = vec![self.quote(&col.name), self.column_type_sql(&col)];
        if inline_pk && col.is_primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if col.is_auto_increment && !self.auto_incr_str().is_empty() {
            parts.push(self.auto_incr_str().to_string());
        }
        parts.push(if col.nullable { "NULL" } else { "NOT NULL" }.to_string());
        if col.default.as_deref().is_some_and(|d| !d.is_empty()) {
            parts.push(format!("DEFAULT {}", self.default_value(&col)));
        }
        parts.join(" ")
    }

    /// Leading `CREATE TABLE ...` up to (not including) the column list.
    fn create_table_prefix(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {}", self.quote(table))
    }

    /// Text after the closing parenthesis of the column list.
    fn create_table_suffix(&self) -> String {
        String::new()
    }

    fn create_table_sql(&self, table: &Table) -> String {
        let columns: Vec<Column> = table
            .columns
            .iter()
            .map(|c| self.normalize_column(c))
            .collect();
        let mut pks = table.primary_keys.clone();
        let mut unique_keys: Vec<Vec<String>> =
            table.uniques.iter().map(|u| vec![u.clone()]).collect();

        fn inline(pks: &[String], col: &Column) -> bool {
            match pks {
                [] => col.is_primary_key,
                [only] => *only == col.name,
                _ => false,
            }
        }

        if let Some(auto) = columns
            .iter()
            .find(|c| c.is_auto_increment && !inline(&pks, c))
        {
            match self.auto_incr_key() {
                AutoIncrKey::None => {}
                AutoIncrKey::Unique => {
                    if !table.uniques.contains(&auto.name) {
                        unique_keys.push(vec![auto.name.clone()]);
                    }
                }
                AutoIncrKey::PrimaryKey => {
                    let declared = std::mem::replace(&mut pks, vec![auto.name.clone()]);
                    let declared: Vec<String> =
                        declared.into_iter().filter(|c| *c != auto.name).collect();
                    if !declared.is_empty() {
                        unique_keys.push(declared);
                    }
                }
            }
        }

        let mut defs: Vec<String> = columns
            .iter()
            .map(|col| self.column_sql(col, inline(&pks, col)))
            .collect();

        if pks.len() > 1 {
            let cols: Vec<String> = pks.iter().map(|c| self.quote(c)).collect();
            defs.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }
        for key in &unique_keys {
            let cols: Vec<String> = key.iter().map(|c| self.quote(c)).collect();
            defs.push(format!("UNIQUE ({})", cols.join(", ")));
        }

        format!(
            "{} (\n{}\n){};",
            self.create_table_prefix(&table.name),
            defs.join(",\n"),
            self.create_table_suffix()
        )
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", self.quote(table))
    }

    fn add_column_sql(&self, table: &str, col: &Column) -> String {
        let mut def = self.column_sql(col, true);
        let col = self.normalize_column(col);
        if col.is_auto_increment
            && !col.is_primary_key
            && self.auto_incr_key() == AutoIncrKey::Unique
        {
            def.push_str(" UNIQUE");
        }
        format!("ALTER TABLE {} ADD COLUMN {};", self.quote(table), def)
    }

    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.quote(table),
            self.quote(column)
        )
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        let unique = match index.kind {
            IndexKind::Unique => " UNIQUE",
            IndexKind::Index => "",
        };
        let cols: Vec<String> = index.cols.iter().map(|c| self.quote(c)).collect();
        format!(
            "CREATE{} INDEX {} ON {} ({});",
            unique,
            self.quote(&index.x_name(table)),
            self.quote(table),
            cols.join(", ")
        )
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        format!(
            "DROP INDEX {} ON {};",
            self.quote(&index.x_name(table)),
            self.quote(table)
        )
    }

    fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {};",
            self.quote(old_name),
            self.quote(new_name)
        )
    }

    fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            self.quote(table),
            self.quote(old_name),
            self.quote(new_name)
        )
    }

    /// `INSERT INTO target (...) SELECT ... FROM source`, columns paired by position.
    fn copy_table_data_sql(
        &self,
        source_table: &str,
        target_table: &str,
        source_cols: &[String],
        target_cols: &[String],
    ) -> String {
        let quote_all =
            |cols: &[String]| cols.iter().map(|c| self.quote(c)).collect::<Vec<_>>().join(", ");
        format!(
            "INSERT INTO {} ({}) SELECT {} FROM {};",
            self.quote(target_table),
            quote_all(target_cols),
            quote_all(source_cols),
            self.quote(source_table)
        )
    }

    /// Bulk column-type alteration.
    fn update_table_sql(&self, table: &str, columns: &[Column]) -> String;

    /// A valid statement with no schema effect.
    fn no_op_sql(&self) -> String {
        "SELECT 0;".to_string()
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery;

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery;

    fn table_check_sql(&self, table: &str) -> CheckQuery;

    /// Native codes for unique violations and deadlocks.
    fn error_codes(&self) -> ErrorCodes;

    fn classify_error(&self, err: &DbError) -> Option<ErrorClass> {
        err.code().and_then(|code| self.error_codes().classify(code))
    }

    fn is_unique_constraint_violation(&self, err: &DbError) -> bool {
        self.classify_error(err) == Some(ErrorClass::UniqueViolation)
    }

    fn is_deadlock(&self, err: &DbError) -> bool {
        self.classify_error(err) == Some(ErrorClass::Deadlock)
    }

    /// Statements that reset the database to an empty schema.
    fn clean_db_plan(&self) -> CleanPlan;
}

/// Live connection used by the engine.
///
/// The engine issues one call at a time and awaits each before the next,
/// so implementations only need to be safe to share, not to pipeline.
#[async_trait]
pub trait SchemaConnection: Send + Sync {
    /// Execute a statement (or batch), returning affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, DbError>;

    /// Whether a parameterized query returns at least one row.
    async fn query_exists(&self, sql: &str, params: &[String]) -> Result<bool, DbError>;

    /// First column of every row, as text.
    async fn query_strings(&self, sql: &str, params: &[String]) -> Result<Vec<String>, DbError>;

    /// Driver name the connection was opened with.
    fn driver_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: ErrorCodes = ErrorCodes {
        unique_violation: &["23505"],
        deadlock: &["40P01"],
    };

    #[test]
    fn test_error_codes_classify() {
        assert_eq!(CODES.classify("23505"), Some(ErrorClass::UniqueViolation));
        assert_eq!(CODES.classify("40P01"), Some(ErrorClass::Deadlock));
        assert_eq!(CODES.classify("42P01"), None);
    }
}
