//! Existence checks that make steps idempotent.

use serde::{Deserialize, Serialize};

use crate::core::schema::Index;
use crate::core::traits::{CheckQuery, Dialect};
use crate::error::DbError;
use crate::session::SchemaSession;

/// A read-only catalog check.
///
/// `*Exists` conditions hold when the object is present, `*NotExists` when
/// it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    ColumnExists { table: String, column: String },
    ColumnNotExists { table: String, column: String },
    IndexExists { table: String, index: Index },
    IndexNotExists { table: String, index: Index },
    TableExists { table: String },
    TableNotExists { table: String },
}

impl Condition {
    pub fn column_exists(table: impl Into<String>, column: impl Into<String>) -> Self {
        Condition::ColumnExists {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn column_not_exists(table: impl Into<String>, column: impl Into<String>) -> Self {
        Condition::ColumnNotExists {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn index_exists(table: impl Into<String>, index: Index) -> Self {
        Condition::IndexExists {
            table: table.into(),
            index,
        }
    }

    pub fn index_not_exists(table: impl Into<String>, index: Index) -> Self {
        Condition::IndexNotExists {
            table: table.into(),
            index,
        }
    }

    pub fn table_exists(table: impl Into<String>) -> Self {
        Condition::TableExists {
            table: table.into(),
        }
    }

    pub fn table_not_exists(table: impl Into<String>) -> Self {
        Condition::TableNotExists {
            table: table.into(),
        }
    }

    /// The catalog query for this check.
    pub fn sql(&self, dialect: &dyn Dialect) -> CheckQuery {
        match self {
            Condition::ColumnExists { table, column }
            | Condition::ColumnNotExists { table, column } => {
                dialect.column_check_sql(table, column)
            }
            Condition::IndexExists { table, index } | Condition::IndexNotExists { table, index } => {
                dialect.index_check_sql(table, &index.x_name(table))
            }
            Condition::TableExists { table } | Condition::TableNotExists { table } => {
                dialect.table_check_sql(table)
            }
        }
    }

    /// Whether the step should run, given whether the object exists.
    pub fn is_fulfilled(&self, exists: bool) -> bool {
        match self {
            Condition::ColumnExists { .. }
            | Condition::IndexExists { .. }
            | Condition::TableExists { .. } => exists,
            Condition::ColumnNotExists { .. }
            | Condition::IndexNotExists { .. }
            | Condition::TableNotExists { .. } => !exists,
        }
    }

    /// Run the check against the session's database.
    pub async fn evaluate(&self, session: &SchemaSession) -> Result<bool, DbError> {
        let exists = session.exists(&self.sql(session.dialect())).await?;
        Ok(self.is_fulfilled(exists))
    }
}
