//! Migration log: which step ids have been applied.
//!
//! The [`MigrationLog`] trait decouples the runner from where its history
//! is kept:
//!
//! - **Database**: [`DbMigrationLog`] keeps a log table in the migrated
//!   database itself
//! - **Memory**: [`MemoryMigrationLog`](super::MemoryMigrationLog) for tests
//!   and ephemeral runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::schema::{Column, ColumnType, Table};
use crate::core::traits::Dialect;
use crate::error::{DbError, MigrateError, Result};
use crate::migration::{AddTableMigration, Migration};
use crate::session::SchemaSession;

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub migration_id: String,
    /// Rendered SQL; empty when the step was skipped by its condition.
    pub sql: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MigrationRecord {
    pub fn success(migration_id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            migration_id: migration_id.into(),
            sql: sql.into(),
            success: true,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(migration_id: impl Into<String>, sql: impl Into<String>, err: &DbError) -> Self {
        Self {
            migration_id: migration_id.into(),
            sql: sql.into(),
            success: false,
            error: Some(err.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Persistence for the runner's history.
///
/// Every method receives the session being migrated; implementations that
/// keep their records elsewhere are free to ignore it.
#[async_trait]
pub trait MigrationLog: Send + Sync {
    /// Prepare storage. Idempotent.
    async fn init(&self, session: &SchemaSession) -> Result<()>;

    /// Ids of every step recorded as successful.
    async fn applied_ids(&self, session: &SchemaSession) -> Result<Vec<String>>;

    async fn record(&self, session: &SchemaSession, record: &MigrationRecord) -> Result<()>;

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

fn log_error(source: DbError) -> MigrateError {
    MigrateError::Log { source }
}

/// Log table stored in the migrated database.
#[derive(Debug, Clone)]
pub struct DbMigrationLog {
    table: String,
}

impl DbMigrationLog {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Shape of the log table.
    pub fn schema(&self) -> Table {
        Table::new(
            self.table.clone(),
            vec![
                Column::new("id", ColumnType::BigInt)
                    .primary_key()
                    .auto_increment(),
                Column::new("migration_id", ColumnType::Varchar).length(255),
                Column::new("sql", ColumnType::Text),
                Column::new("success", ColumnType::Bool),
                Column::new("error", ColumnType::Text).nullable(true),
                Column::new("timestamp", ColumnType::DateTime),
            ],
        )
    }

    /// Whether the log table has been created.
    pub async fn exists(&self, session: &SchemaSession) -> Result<bool> {
        session.table_exists(&self.table).await.map_err(log_error)
    }

    fn insert_sql(&self, dialect: &dyn Dialect, record: &MigrationRecord) -> String {
        let cols = ["migration_id", "sql", "success", "error", "timestamp"]
            .iter()
            .map(|c| dialect.quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let error = match &record.error {
            Some(e) => dialect.string_literal(e),
            None => "NULL".to_string(),
        };
        let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        format!(
            "INSERT INTO {} ({}) VALUES ({}, {}, {}, {}, {});",
            dialect.quote(&self.table),
            cols,
            dialect.string_literal(&record.migration_id),
            dialect.string_literal(&record.sql),
            dialect.boolean_str(record.success),
            error,
            dialect.string_literal(&timestamp)
        )
    }
}

#[async_trait]
impl MigrationLog for DbMigrationLog {
    async fn init(&self, session: &SchemaSession) -> Result<()> {
        if self.exists(session).await? {
            debug!("Migration log table {} exists", self.table);
            return Ok(());
        }
        let sql = AddTableMigration::new(self.schema()).sql(session.dialect());
        session.execute(&sql).await.map_err(log_error)?;
        info!("Created migration log table {}", self.table);
        Ok(())
    }

    async fn applied_ids(&self, session: &SchemaSession) -> Result<Vec<String>> {
        let dialect = session.dialect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            dialect.quote("migration_id"),
            dialect.quote(&self.table),
            dialect.quote("success"),
            dialect.boolean_str(true)
        );
        session
            .connection()
            .query_strings(&sql, &[])
            .await
            .map_err(log_error)
    }

    async fn record(&self, session: &SchemaSession, record: &MigrationRecord) -> Result<()> {
        let sql = self.insert_sql(session.dialect(), record);
        session.execute(&sql).await.map_err(log_error)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "database"
    }
}
