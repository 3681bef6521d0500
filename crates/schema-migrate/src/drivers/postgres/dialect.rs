//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Auto-increment is expressed through the SERIAL family, so the
//! auto-increment token is empty.

use crate::core::identifier::quote_with;
use crate::core::schema::{Column, ColumnType, Index};
use crate::core::traits::{CheckQuery, CleanPlan, Dialect, ErrorCodes};

const ERROR_CODES: ErrorCodes = ErrorCodes {
    unique_violation: &["23505"],
    deadlock: &["40P01"],
};

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote(&self, name: &str) -> String {
        quote_with(name, '"', '"')
    }

    fn like_str(&self) -> &str {
        "ILIKE"
    }

    fn auto_incr_str(&self) -> &str {
        ""
    }

    fn boolean_str(&self, value: bool) -> String {
        let literal = if value { "TRUE" } else { "FALSE" };
        literal.to_string()
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn sql_type(&self, col: &Column) -> String {
        let auto = col.is_auto_increment;
        match col.column_type {
            ColumnType::TinyInt | ColumnType::SmallInt => {
                let ty = if auto { "SMALLSERIAL" } else { "SMALLINT" };
                ty.to_string()
            }
            ColumnType::MediumInt | ColumnType::Int | ColumnType::Integer => {
                let ty = if auto { "SERIAL" } else { "INTEGER" };
                ty.to_string()
            }
            ColumnType::BigInt => {
                let ty = if auto { "BIGSERIAL" } else { "BIGINT" };
                ty.to_string()
            }
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::BigSerial => "BIGSERIAL".to_string(),
            // any other type asked to auto-increment becomes the widest serial
            _ if auto => "BIGSERIAL".to_string(),
            ColumnType::Binary
            | ColumnType::VarBinary
            | ColumnType::TinyBlob
            | ColumnType::Blob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Bytea => "BYTEA".to_string(),
            ColumnType::DateTime | ColumnType::TimeStamp => "TIMESTAMP".to_string(),
            ColumnType::TimeStampz => "timestamp with time zone".to_string(),
            ColumnType::Real | ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText => "TEXT".to_string(),
            ColumnType::NVarchar => format!("VARCHAR{}", col.length_suffix()),
            ColumnType::Bit
            | ColumnType::Char
            | ColumnType::Varchar
            | ColumnType::Decimal
            | ColumnType::Numeric => {
                format!("{}{}", col.column_type.name(), col.length_suffix())
            }
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Bool => "BOOL".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSON".to_string(),
        }
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        format!("DROP INDEX {} CASCADE;", self.quote(&index.x_name(table)))
    }

    fn update_table_sql(&self, table: &str, columns: &[Column]) -> String {
        let alters: Vec<String> = columns
            .iter()
            .map(|col| {
                let col = self.normalize_column(col);
                format!("ALTER {} TYPE {}", self.quote(&col.name), self.sql_type(&col))
            })
            .collect();
        format!("ALTER TABLE {} {};", self.quote(table), alters.join(", "))
    }

    fn index_check_sql(&self, table: &str, index_name: &str) -> CheckQuery {
        (
            format!(
                "SELECT 1 FROM {} WHERE {} = $1::text AND {} = $2::text",
                self.quote("pg_indexes"),
                self.quote("tablename"),
                self.quote("indexname")
            ),
            vec![table.to_string(), index_name.to_string()],
        )
    }

    fn column_check_sql(&self, table: &str, column: &str) -> CheckQuery {
        (
            "SELECT 1 FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1::text \
             AND column_name = $2::text"
                .to_string(),
            vec![table.to_string(), column.to_string()],
        )
    }

    fn table_check_sql(&self, table: &str) -> CheckQuery {
        (
            "SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1::text"
                .to_string(),
            vec![table.to_string()],
        )
    }

    fn error_codes(&self) -> ErrorCodes {
        ERROR_CODES
    }

    fn clean_db_plan(&self) -> CleanPlan {
        CleanPlan::Statements(vec![
            "DROP SCHEMA public CASCADE;".to_string(),
            "CREATE SCHEMA public;".to_string(),
        ])
    }
}
