//! MySQL schema connection over mysql_async.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Row};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::core::traits::SchemaConnection;
use crate::error::{DbError, MigrateError, Result};

/// Single mysql_async connection.
///
/// Session settings such as `FOREIGN_KEY_CHECKS` persist across calls, which
/// the clean-db plan relies on.
pub struct MysqlConnection {
    conn: Mutex<Conn>,
}

impl MysqlConnection {
    /// Connect and verify the session with `SELECT 1`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if !config.ssl_mode.eq_ignore_ascii_case("disable") {
            warn!("MySQL TLS is not available. Credentials will be transmitted in plaintext.");
        }

        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.as_str())
            .tcp_port(config.effective_port())
            .db_name(Some(config.database.as_str()))
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        let mut conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::connection("mysql", e))?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection("mysql", e))?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn db_error(e: mysql_async::Error) -> DbError {
    match e {
        mysql_async::Error::Server(server) => {
            DbError::with_code(server.code.to_string(), server.message)
        }
        other => DbError::new(other.to_string()),
    }
}

#[async_trait]
impl SchemaConnection for MysqlConnection {
    async fn execute(&self, sql: &str) -> std::result::Result<u64, DbError> {
        let mut conn = self.conn.lock().await;
        conn.query_drop(sql).await.map_err(db_error)?;
        Ok(conn.affected_rows())
    }

    async fn query_exists(&self, sql: &str, params: &[String]) -> std::result::Result<bool, DbError> {
        let mut conn = self.conn.lock().await;
        let row: Option<Row> = conn
            .exec_first(sql, params.to_vec())
            .await
            .map_err(db_error)?;
        Ok(row.is_some())
    }

    async fn query_strings(
        &self,
        sql: &str,
        params: &[String],
    ) -> std::result::Result<Vec<String>, DbError> {
        let mut conn = self.conn.lock().await;
        conn.exec(sql, params.to_vec()).await.map_err(db_error)
    }

    fn driver_name(&self) -> &str {
        "mysql"
    }
}
