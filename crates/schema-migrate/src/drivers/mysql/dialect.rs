//! MySQL/MariaDB SQL dialect.
//!
//! Tables are created as InnoDB with utf8mb4; character columns carry an
//! explicit utf8mb4 collation so charset migrations converge.

use crate::core::identifier::quote_with;
use crate::core::schema::{Column, ColumnType};
use crate::core::traits::{AutoIncrKey, CheckQuery, CleanPlan, Dialect, ErrorCodes};

const ERROR_CODES: ErrorCodes = ErrorCodes {
    unique_violation: &["1062"],
    deadlock: &["1213"],
};

const CHARSET_CLAUSE: &str = " CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci";

/// Length used for variable-width columns declared without one.
const DEFAULT_VARCHAR_LENGTH: u32 = 255;

/// MySQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }

    fn sized(name: &str, col: &Column, fallback: u32) -> String {
        if col.length == 0 && col.length2 == 0 {
            format!("{}({})", name, fallback)
        } else {
            format!("{}{}", name, col.length_suffix())
        }
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote(&self, name: &str) -> String {
        quote_with(name, '`', '`')
    }

    fn auto_incr_str(&self) -> &str {
        "AUTO_INCREMENT"
    }

    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn sql_type(&self, col: &Column) -> String {
        match col.column_type {
            ColumnType::Serial => "INT".to_string(),
            ColumnType::BigSerial => "BIGINT".to_string(),
            ColumnType::TinyInt
            | ColumnType::SmallInt
            | ColumnType::MediumInt
            | ColumnType::Int
            | ColumnType::Integer
            | ColumnType::BigInt => col.column_type.name().to_string(),
            _ if col.is_auto_increment => "BIGINT".to_string(),
            ColumnType::Bool => "TINYINT(1)".to_string(),
            ColumnType::Bit | ColumnType::Decimal | ColumnType::Numeric => {
                format!("{}{}", col.column_type.name(), col.length_suffix())
            }
            ColumnType::Real | ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Char => format!("CHAR{}", col.length_suffix()),
            ColumnType::Varchar | ColumnType::NVarchar => {
                Self::sized("VARCHAR", col, DEFAULT_VARCHAR_LENGTH)
            }
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText => col.column_type.name().to_string(),
            ColumnType::Binary => format!("BINARY{}", col.length_suffix()),
            ColumnType::VarBinary => Self::sized("VARBINARY", col, DEFAULT_VARCHAR_LENGTH),
            ColumnType::TinyBlob
            | ColumnType::Blob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Bytea => "LONGBLOB".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::TimeStamp => "TIMESTAMP".to_string(),
            ColumnType::TimeStampz => "CHAR(64)".to_string(),
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Json => "JSON".to_string(),
        }
    }

    fn column_type_sql(&self, col: &Column) -> String {
        let ty = self.sql_type(col);
        if col.column_type.is_text() && !col.is_auto_increment {
            format!("{}{}", ty, CHARSET_CLAUSE)
        } else {
            ty
        }
    }

    /// AUTO_INCREMENT must lead an index.
    fn auto_incr_key(&self) -> AutoIncrKey {
        AutoIncrKey::Unique
    }

    fn normalize_column(&self, col: &Column) -> Column {
        let mut col = col.normalized();
        if col.column_type.implies_auto_increment() {
            col.is_primary_key = true;
        }
        col
    }

    fn create_table_suffix(&self) -> String {
        " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4".to_string()
    }

    /// Converts the table default charset and re-declares each column.
    fn update_table_sql(&self, table: &str, columns: &[Column]) -> String {
        let mut alters = vec!["DEFAULT CHARSET utf8mb4 COLLATE utf8mb4_unicode_ci".to_string()];
        alters.extend(
            columns
                .iter()
                .map(|col| format!("MODIFY {}", self.column_sql(col, false))),
        );
        format!("ALTER TABLE {} {};", self.quote(table), alters.join(", "))
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery {
        (
            "SELECT 1 FROM INFORMATION_SCHEMA.STATISTICS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME = ?"
                .to_string(),
            vec![table.to_string(), index_name.to_string()],
        )
    }

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery {
        (
            "SELECT 1 FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?"
                .to_string(),
            vec![table.to_string(), column.to_string()],
        )
    }

    fn table_check_sql(&self, table: &str) -> CheckQuery {
        (
            "SELECT 1 FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
                .to_string(),
            vec![table.to_string()],
        )
    }

    fn error_codes(&self) -> ErrorCodes {
        ERROR_CODES
    }

    fn clean_db_plan(&self) -> CleanPlan {
        CleanPlan::DropTables {
            list_sql: "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
                       WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'"
                .to_string(),
            before: vec!["SET FOREIGN_KEY_CHECKS = 0;".to_string()],
            after: vec!["SET FOREIGN_KEY_CHECKS = 1;".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Index, Table};
    use crate::error::DbError;

    #[test]
    fn test_quote() {
        let d = MysqlDialect::new();
        assert_eq!(d.quote("users"), "`users`");
        assert_eq!(d.quote("table`name"), "`table``name`");
        assert_eq!(d.quote("`users`"), "`users`");
    }

    #[test]
    fn test_sql_type() {
        let d = MysqlDialect::new();
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Bool)), "TINYINT(1)");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::BigSerial)), "BIGINT");
        assert_eq!(
            d.sql_type(&Column::new("a", ColumnType::Varchar).length(40)),
            "VARCHAR(40)"
        );
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Varchar)), "VARCHAR(255)");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::MediumBlob)), "LONGBLOB");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Float)), "FLOAT");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Double)), "DOUBLE");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Uuid)), "CHAR(36)");
    }

    #[test]
    fn test_serial_becomes_auto_increment_key() {
        let d = MysqlDialect::new();
        let table = Table::new("alert", vec![Column::new("id", ColumnType::BigSerial)]);
        let sql = d.create_table_sql(&table);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `alert` (\n\
             `id` BIGINT PRIMARY KEY AUTO_INCREMENT NOT NULL\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"
        );
    }

    #[test]
    fn test_charset_only_in_column_definitions() {
        let d = MysqlDialect::new();
        let col = Column::new("login", ColumnType::Varchar).length(190);
        assert_eq!(
            d.column_sql(&col, false),
            "`login` VARCHAR(190) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci NOT NULL"
        );
        assert!(d
            .add_column_sql("user", &col)
            .contains("VARCHAR(190) CHARACTER SET utf8mb4"));
        assert!(d
            .update_table_sql("user", &[col])
            .contains("MODIFY `login` VARCHAR(190) CHARACTER SET utf8mb4"));
        assert_eq!(
            d.column_sql(&Column::new("n", ColumnType::Int), false),
            "`n` INT NOT NULL"
        );
    }

    #[test]
    fn test_serial_beside_declared_key_keeps_auto_increment() {
        let d = MysqlDialect::new();
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
             `id` INT AUTO_INCREMENT NOT NULL,\n\
             `code` VARCHAR(10) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci PRIMARY KEY NOT NULL,\n\
             UNIQUE (`id`)\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"
        );
    }

    #[test]
    fn test_auto_increment_column_added_with_key() {
        let d = MysqlDialect::new();
        let sql = d.add_column_sql("orders", &Column::new("seq", ColumnType::Int).auto_increment());
        assert_eq!(
            sql,
            "ALTER TABLE `orders` ADD COLUMN `seq` INT AUTO_INCREMENT NOT NULL UNIQUE;"
        );
        let sql = d.update_table_sql("orders", &[Column::new("seq", ColumnType::BigInt).auto_increment()]);
        assert!(sql.contains("MODIFY `seq` BIGINT AUTO_INCREMENT NOT NULL"));
        assert!(!sql.contains("UNIQUE"));
    }

    #[test]
    fn test_default_bool() {
        let d = MysqlDialect::new();
        let col = Column::new("flag", ColumnType::Bool);
        assert_eq!(d.default_value(&col.clone().default_value("0")), "0");
        assert_eq!(d.default_value(&col.default_value("true")), "1");
    }

    #[test]
    fn test_update_table_modifies_in_order() {
        let d = MysqlDialect::new();
        let sql = d.update_table_sql(
            "user",
            &[
                Column::new("login", ColumnType::Varchar).length(190),
                Column::new("email", ColumnType::Varchar).length(190).nullable(true),
            ],
        );
        let login = sql.find("MODIFY `login`").unwrap();
        let email = sql.find("MODIFY `email`").unwrap();
        assert!(sql.starts_with("ALTER TABLE `user` DEFAULT CHARSET utf8mb4"));
        assert!(login < email);
        assert_eq!(sql.matches("ALTER TABLE").count(), 1);
    }

    #[test]
    fn test_drop_index_names_table() {
        let d = MysqlDialect::new();
        let sql = d.drop_index_sql("user", &Index::unique(["login"]));
        assert_eq!(sql, "DROP INDEX `UQE_user_login` ON `user`;");
    }

    #[test]
    fn test_string_literal_escapes_backslash() {
        let d = MysqlDialect::new();
        assert_eq!(d.string_literal("a\\'b"), "'a\\\\''b'");
    }

    #[test]
    fn test_error_classification() {
        let d = MysqlDialect::new();
        assert!(d.is_unique_constraint_violation(&DbError::with_code("1062", "Duplicate entry")));
        assert!(!d.is_unique_constraint_violation(&DbError::with_code("23505", "pg code")));
        assert!(d.is_deadlock(&DbError::with_code("1213", "Deadlock found")));
        assert!(!d.is_deadlock(&DbError::new("lost connection")));
    }

    #[test]
    fn test_clean_plan_disables_fk_checks() {
        match MysqlDialect::new().clean_db_plan() {
            CleanPlan::DropTables { before, after, .. } => {
                assert_eq!(before, vec!["SET FOREIGN_KEY_CHECKS = 0;"]);
                assert_eq!(after, vec!["SET FOREIGN_KEY_CHECKS = 1;"]);
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }
}
