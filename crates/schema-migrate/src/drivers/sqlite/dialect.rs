//! SQLite SQL dialect.
//!
//! SQLite uses type affinity, so every semantic type collapses to one of
//! INTEGER, REAL, NUMERIC, TEXT, BLOB or DATETIME and never carries size
//! parameters.

use crate::core::identifier::quote_with;
use crate::core::schema::{Column, ColumnType, Index};
use crate::core::traits::{AutoIncrKey, CheckQuery, CleanPlan, Dialect, ErrorCodes};

// Extended result codes: SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY,
// then SQLITE_BUSY and SQLITE_LOCKED with their extended forms.
const ERROR_CODES: ErrorCodes = ErrorCodes {
    unique_violation: &["2067", "1555"],
    deadlock: &["5", "261", "517", "6", "262"],
};

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite3"
    }

    fn quote(&self, name: &str) -> String {
        quote_with(name, '`', '`')
    }

    fn auto_incr_str(&self) -> &str {
        "AUTOINCREMENT"
    }

    fn sql_type(&self, col: &Column) -> String {
        let ty = match col.column_type {
            ColumnType::Bit
            | ColumnType::TinyInt
            | ColumnType::SmallInt
            | ColumnType::MediumInt
            | ColumnType::Int
            | ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::Serial
            | ColumnType::BigSerial
            | ColumnType::Bool => "INTEGER",
            _ if col.is_auto_increment => "INTEGER",
            ColumnType::Date | ColumnType::Time | ColumnType::DateTime | ColumnType::TimeStamp => {
                "DATETIME"
            }
            ColumnType::TimeStampz
            | ColumnType::Char
            | ColumnType::Varchar
            | ColumnType::NVarchar
            | ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Uuid
            | ColumnType::Json => "TEXT",
            ColumnType::Real | ColumnType::Float | ColumnType::Double => "REAL",
            ColumnType::Decimal | ColumnType::Numeric => "NUMERIC",
            ColumnType::Binary
            | ColumnType::VarBinary
            | ColumnType::TinyBlob
            | ColumnType::Blob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Bytea => "BLOB",
        };
        ty.to_string()
    }

    /// AUTOINCREMENT is only legal on an INTEGER PRIMARY KEY.
    fn normalize_column(&self, col: &Column) -> Column {
        let mut col = col.normalized();
        if col.is_auto_increment {
            col.is_primary_key = true;
        }
        col
    }

    fn auto_incr_key(&self) -> AutoIncrKey {
        AutoIncrKey::PrimaryKey
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        format!("DROP INDEX IF EXISTS {};", self.quote(&index.x_name(table)))
    }

    /// Column types are affinities and cannot be altered in place.
    fn update_table_sql(&self, _table: &str, _columns: &[Column]) -> String {
        self.no_op_sql()
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery {
        (
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND tbl_name = ? AND name = ?"
                .to_string(),
            vec![table.to_string(), index_name.to_string()],
        )
    }

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery {
        (
            "SELECT 1 FROM pragma_table_info(?) WHERE name = ?".to_string(),
            vec![table.to_string(), column.to_string()],
        )
    }

    fn table_check_sql(&self, table: &str) -> CheckQuery {
        (
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?".to_string(),
            vec![table.to_string()],
        )
    }

    fn error_codes(&self) -> ErrorCodes {
        ERROR_CODES
    }

    fn clean_db_plan(&self) -> CleanPlan {
        CleanPlan::DropTables {
            list_sql: "SELECT name FROM sqlite_master \
                       WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"
                .to_string(),
            before: vec!["PRAGMA foreign_keys = OFF;".to_string()],
            after: vec!["PRAGMA foreign_keys = ON;".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Table;
    use crate::error::DbError;

    #[test]
    fn test_sql_type_never_parameterized() {
        let d = SqliteDialect::new();
        for t in ColumnType::ALL {
            let ty = d.sql_type(&Column::new("a", t).precision(10, 2));
            assert!(!ty.contains('('), "{:?} rendered {}", t, ty);
        }
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Bool)), "INTEGER");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Double)), "REAL");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::TimeStampz)), "TEXT");
    }

    #[test]
    fn test_serial_pk_autoincrement() {
        let d = SqliteDialect::new();
        let table = Table::new(
            "star",
            vec![
                Column::new("id", ColumnType::Serial),
                Column::new("user_id", ColumnType::BigInt),
            ],
        );
        let sql = d.create_table_sql(&table);
        assert!(sql.contains("`id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"));
        assert!(sql.contains("`user_id` INTEGER NOT NULL"));
    }

    #[test]
    fn test_auto_increment_takes_primary_key() {
        let d = SqliteDialect::new();
        let table = Table::new(
            "code",
            vec![
                Column::new("id", ColumnType::Serial),
                Column::new("code", ColumnType::Varchar).length(10).primary_key(),
            ],
        );
        assert_eq!(
            d.create_table_sql(&table),
            "CREATE TABLE IF NOT EXISTS `code` (\n\
             `id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,\n\
             `code` TEXT NOT NULL,\n\
             UNIQUE (`code`)\n\
             );"
        );

        let table = Table::new(
            "seq",
            vec![
                Column::new("n", ColumnType::Int).auto_increment(),
                Column::new("label", ColumnType::Text),
            ],
        );
        assert!(d
            .create_table_sql(&table)
            .contains("`n` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"));
    }

    #[test]
    fn test_update_table_is_no_op() {
        let d = SqliteDialect::new();
        let sql = d.update_table_sql("t", &[Column::new("a", ColumnType::Text)]);
        assert_eq!(sql, "SELECT 0;");
    }

    #[test]
    fn test_drop_index_if_exists() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.drop_index_sql("star", &Index::new(["user_id"])),
            "DROP INDEX IF EXISTS `IDX_star_user_id`;"
        );
    }

    #[test]
    fn test_error_classification() {
        let d = SqliteDialect::new();
        assert!(d.is_unique_constraint_violation(&DbError::with_code("2067", "UNIQUE failed")));
        assert!(d.is_unique_constraint_violation(&DbError::with_code("1555", "PK failed")));
        assert!(!d.is_unique_constraint_violation(&DbError::with_code("787", "FK failed")));
        assert!(d.is_deadlock(&DbError::with_code("5", "database is locked")));
    }
}
