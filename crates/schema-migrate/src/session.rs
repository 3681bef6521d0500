//! A dialect paired with a live connection.
//!
//! [`SchemaSession`] is what conditions, the runner and the migration log
//! talk to. It owns no migration state; the dialect is immutable and the
//! connection is only ever used by one caller at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::traits::{CheckQuery, CleanPlan, Dialect, SchemaConnection};
use crate::drivers::DialectImpl;
use crate::error::{DbError, MigrateError, Result};

pub struct SchemaSession {
    dialect: DialectImpl,
    conn: Arc<dyn SchemaConnection>,
}

impl SchemaSession {
    pub fn new(dialect: DialectImpl, conn: Arc<dyn SchemaConnection>) -> Self {
        Self { dialect, conn }
    }

    pub fn dialect(&self) -> &DialectImpl {
        &self.dialect
    }

    pub fn dialect_name(&self) -> &str {
        self.dialect.name()
    }

    pub fn connection(&self) -> &dyn SchemaConnection {
        self.conn.as_ref()
    }

    /// Execute one rendered statement.
    pub async fn execute(&self, sql: &str) -> std::result::Result<u64, DbError> {
        debug!("Executing: {}", sql);
        self.conn.execute(sql).await
    }

    /// Round-trip the dialect's no-op statement.
    pub async fn ping(&self) -> Result<()> {
        self.conn.execute(&self.dialect.no_op_sql()).await?;
        Ok(())
    }

    pub async fn exists(&self, query: &CheckQuery) -> std::result::Result<bool, DbError> {
        let (sql, params) = query;
        self.conn.query_exists(sql, params).await
    }

    pub async fn index_exists(
        &self,
        table: &str,
        index_name: &str,
    ) -> std::result::Result<bool, DbError> {
        self.exists(&self.dialect.index_check_sql(table, index_name))
            .await
    }

    pub async fn column_exists(
        &self,
        table: &str,
        column: &str,
    ) -> std::result::Result<bool, DbError> {
        self.exists(&self.dialect.column_check_sql(table, column))
            .await
    }

    pub async fn table_exists(&self, table: &str) -> std::result::Result<bool, DbError> {
        self.exists(&self.dialect.table_check_sql(table)).await
    }

    /// Drop every user object, leaving an empty default schema.
    ///
    /// Destructive. Stops at the first failing statement and returns
    /// [`MigrateError::CleanDb`] naming it; later statements are not run.
    pub async fn clean_db(&self) -> Result<()> {
        warn!("Cleaning {} database: dropping all tables", self.dialect_name());

        match self.dialect.clean_db_plan() {
            CleanPlan::Statements(statements) => {
                for statement in &statements {
                    self.clean_step(statement).await?;
                }
            }
            CleanPlan::DropTables {
                list_sql,
                before,
                after,
            } => {
                let tables = self
                    .conn
                    .query_strings(&list_sql, &[])
                    .await
                    .map_err(|source| MigrateError::CleanDb {
                        statement: list_sql.clone(),
                        source,
                    })?;

                for statement in &before {
                    self.clean_step(statement).await?;
                }
                for table in &tables {
                    let drop = self.dialect.drop_table_sql(table);
                    if let Err(e) = self.clean_step(&drop).await {
                        self.restore_session(&after).await;
                        return Err(e);
                    }
                }
                for statement in &after {
                    self.clean_step(statement).await?;
                }
                info!("Dropped {} tables", tables.len());
            }
        }

        info!("Database cleaned");
        Ok(())
    }

    async fn clean_step(&self, statement: &str) -> Result<()> {
        debug!("Clean: {}", statement);
        self.conn
            .execute(statement)
            .await
            .map(|_| ())
            .map_err(|source| MigrateError::CleanDb {
                statement: statement.to_string(),
                source,
            })
    }

    /// Re-enable session settings after a failed drop. Failures here are
    /// logged; the drop error is what gets reported.
    async fn restore_session(&self, statements: &[String]) {
        for statement in statements {
            if let Err(e) = self.conn.execute(statement).await {
                warn!("Failed to restore session with '{}': {}", statement, e);
            }
        }
    }
}
