//! MSSQL SQL dialect (Strategy pattern).
//!
//! SQL Server has no `CREATE TABLE IF NOT EXISTS` and renames through
//! `sp_rename`, so those statements are overridden here. Parameters use the
//! `@Pn` form tiberius binds.

use crate::core::identifier::quote_with;
use crate::core::schema::{Column, ColumnType};
use crate::core::traits::{CheckQuery, CleanPlan, Dialect, ErrorCodes};

const ERROR_CODES: ErrorCodes = ErrorCodes {
    unique_violation: &["2627", "2601"],
    deadlock: &["1205"],
};

const DROP_FOREIGN_KEYS: &str = "DECLARE @sql NVARCHAR(MAX) = N''; \
    SELECT @sql = @sql + N'ALTER TABLE ' + QUOTENAME(OBJECT_SCHEMA_NAME(parent_object_id)) \
    + N'.' + QUOTENAME(OBJECT_NAME(parent_object_id)) \
    + N' DROP CONSTRAINT ' + QUOTENAME(name) + N';' FROM sys.foreign_keys; \
    EXEC sp_executesql @sql;";

const DROP_TABLES: &str = "DECLARE @sql NVARCHAR(MAX) = N''; \
    SELECT @sql = @sql + N'DROP TABLE ' + QUOTENAME(SCHEMA_NAME(schema_id)) \
    + N'.' + QUOTENAME(name) + N';' FROM sys.tables WHERE is_ms_shipped = 0; \
    EXEC sp_executesql @sql;";

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn sized(name: &str, col: &Column, fallback: &str) -> String {
        if col.length == 0 && col.length2 == 0 {
            format!("{}({})", name, fallback)
        } else {
            format!("{}{}", name, col.length_suffix())
        }
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn quote(&self, name: &str) -> String {
        quote_with(name, '[', ']')
    }

    fn auto_incr_str(&self) -> &str {
        "IDENTITY(1,1)"
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("@P{}", index)
    }

    fn string_literal(&self, value: &str) -> String {
        format!("N'{}'", value.replace('\'', "''"))
    }

    fn sql_type(&self, col: &Column) -> String {
        match col.column_type {
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::MediumInt | ColumnType::Int | ColumnType::Integer | ColumnType::Serial => {
                "INT".to_string()
            }
            ColumnType::BigInt | ColumnType::BigSerial => "BIGINT".to_string(),
            _ if col.is_auto_increment => "BIGINT".to_string(),
            ColumnType::Bit | ColumnType::Bool => "BIT".to_string(),
            ColumnType::Decimal | ColumnType::Numeric => {
                format!("{}{}", col.column_type.name(), col.length_suffix())
            }
            ColumnType::Real | ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "FLOAT".to_string(),
            ColumnType::Char => format!("CHAR{}", col.length_suffix()),
            ColumnType::Varchar => Self::sized("VARCHAR", col, "255"),
            ColumnType::NVarchar => Self::sized("NVARCHAR", col, "255"),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json => "NVARCHAR(MAX)".to_string(),
            ColumnType::Binary => format!("BINARY{}", col.length_suffix()),
            ColumnType::VarBinary => Self::sized("VARBINARY", col, "MAX"),
            ColumnType::TinyBlob
            | ColumnType::Blob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Bytea => "VARBINARY(MAX)".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime | ColumnType::TimeStamp => "DATETIME2".to_string(),
            ColumnType::TimeStampz => "DATETIMEOFFSET".to_string(),
            ColumnType::Uuid => "UNIQUEIDENTIFIER".to_string(),
        }
    }

    fn normalize_column(&self, col: &Column) -> Column {
        let mut col = col.normalized();
        if col.column_type.implies_auto_increment() {
            col.is_primary_key = true;
        }
        col
    }

    fn create_table_prefix(&self, table: &str) -> String {
        let quoted = self.quote(table);
        format!(
            "IF OBJECT_ID({}, N'U') IS NULL CREATE TABLE {}",
            self.string_literal(&quoted),
            quoted
        )
    }

    fn add_column_sql(&self, table: &str, col: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD {};",
            self.quote(table),
            self.column_sql(col, true)
        )
    }

    fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        format!(
            "EXEC sp_rename {}, {};",
            self.string_literal(old_name),
            self.string_literal(new_name)
        )
    }

    fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "EXEC sp_rename {}, {}, N'COLUMN';",
            self.string_literal(&format!("{}.{}", table, old_name)),
            self.string_literal(new_name)
        )
    }

    /// SQL Server alters one column per statement; the statements are sent
    /// together as one batch.
    fn update_table_sql(&self, table: &str, columns: &[Column]) -> String {
        let table = self.quote(table);
        columns
            .iter()
            .map(|col| {
                let col = self.normalize_column(col);
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} {} {};",
                    table,
                    self.quote(&col.name),
                    self.sql_type(&col),
                    if col.nullable { "NULL" } else { "NOT NULL" }
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery {
        (
            "SELECT 1 FROM sys.indexes WHERE object_id = OBJECT_ID(@P1) AND name = @P2".to_string(),
            vec![table.to_string(), index_name.to_string()],
        )
    }

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery {
        (
            "SELECT 1 FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = @P1 AND COLUMN_NAME = @P2"
                .to_string(),
            vec![table.to_string(), column.to_string()],
        )
    }

    fn table_check_sql(&self, table: &str) -> CheckQuery {
        (
            "SELECT 1 FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_NAME = @P1 AND TABLE_TYPE = 'BASE TABLE'"
                .to_string(),
            vec![table.to_string()],
        )
    }

    fn error_codes(&self) -> ErrorCodes {
        ERROR_CODES
    }

    fn clean_db_plan(&self) -> CleanPlan {
        CleanPlan::Statements(vec![DROP_FOREIGN_KEYS.to_string(), DROP_TABLES.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Index, Table};
    use crate::error::DbError;

    #[test]
    fn test_quote() {
        let d = MssqlDialect::new();
        assert_eq!(d.quote("users"), "[users]");
        assert_eq!(d.quote("table]name"), "[table]]name]");
        assert_eq!(d.quote("[users]"), "[users]");
    }

    #[test]
    fn test_param_placeholder() {
        let d = MssqlDialect::new();
        assert_eq!(d.param_placeholder(1), "@P1");
        assert_eq!(d.param_placeholder(10), "@P10");
    }

    #[test]
    fn test_sql_type() {
        let d = MssqlDialect::new();
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Bool)), "BIT");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::LongText)), "NVARCHAR(MAX)");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::NVarchar).length(64)), "NVARCHAR(64)");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Blob)), "VARBINARY(MAX)");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Double)), "FLOAT");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Float)), "REAL");
        assert_eq!(d.sql_type(&Column::new("a", ColumnType::Uuid)), "UNIQUEIDENTIFIER");
    }

    #[test]
    fn test_create_table_guarded() {
        let d = MssqlDialect::new();
        let table = Table::new(
            "org",
            vec![
                Column::new("id", ColumnType::BigInt).primary_key().auto_increment(),
                Column::new("name", ColumnType::NVarchar).length(190),
            ],
        );
        let sql = d.create_table_sql(&table);
        assert!(sql.starts_with("IF OBJECT_ID(N'[org]', N'U') IS NULL CREATE TABLE [org] ("));
        assert!(sql.contains("[id] BIGINT PRIMARY KEY IDENTITY(1,1) NOT NULL"));
        assert!(sql.contains("[name] NVARCHAR(190) NOT NULL"));
    }

    #[test]
    fn test_add_column_has_no_column_keyword() {
        let d = MssqlDialect::new();
        let sql = d.add_column_sql("org", &Column::new("theme", ColumnType::Varchar).length(30).nullable(true));
        assert_eq!(sql, "ALTER TABLE [org] ADD [theme] VARCHAR(30) NULL;");
    }

    #[test]
    fn test_identity_without_primary_key() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.add_column_sql("orders", &Column::new("seq", ColumnType::Int).auto_increment()),
            "ALTER TABLE [orders] ADD [seq] INT IDENTITY(1,1) NOT NULL;"
        );

        let table = Table::new(
            "code",
            vec![
                Column::new("id", ColumnType::Serial),
                Column::new("code", ColumnType::Varchar).length(10).primary_key(),
            ],
        );
        let sql = d.create_table_sql(&table);
        assert!(sql.contains("[id] INT IDENTITY(1,1) NOT NULL,"), "{}", sql);
        assert!(sql.contains("[code] VARCHAR(10) PRIMARY KEY NOT NULL"), "{}", sql);
        assert!(!sql.contains("UNIQUE"), "{}", sql);
    }

    #[test]
    fn test_renames_use_sp_rename() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.rename_table_sql("old_tbl", "new_tbl"),
            "EXEC sp_rename N'old_tbl', N'new_tbl';"
        );
        assert_eq!(
            d.rename_column_sql("org", "nme", "name"),
            "EXEC sp_rename N'org.nme', N'name', N'COLUMN';"
        );
    }

    #[test]
    fn test_drop_index() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.drop_index_sql("org", &Index::new(["name"])),
            "DROP INDEX [IDX_org_name] ON [org];"
        );
    }

    #[test]
    fn test_update_table_one_batch_in_order() {
        let d = MssqlDialect::new();
        let sql = d.update_table_sql(
            "org",
            &[
                Column::new("name", ColumnType::NVarchar).length(190),
                Column::new("address", ColumnType::Text).nullable(true),
            ],
        );
        assert_eq!(
            sql,
            "ALTER TABLE [org] ALTER COLUMN [name] NVARCHAR(190) NOT NULL; \
             ALTER TABLE [org] ALTER COLUMN [address] NVARCHAR(MAX) NULL;"
        );
    }

    #[test]
    fn test_error_classification() {
        let d = MssqlDialect::new();
        assert!(d.is_unique_constraint_violation(&DbError::with_code("2627", "PK violation")));
        assert!(d.is_unique_constraint_violation(&DbError::with_code("2601", "dup key row")));
        assert!(d.is_deadlock(&DbError::with_code("1205", "deadlock victim")));
        assert!(!d.is_deadlock(&DbError::with_code("2627", "PK violation")));
    }
}
