//! SQLite schema connection over sqlx.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection as SqlxConnection};
use sqlx::{ConnectOptions, Row};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::core::traits::SchemaConnection;
use crate::error::{DbError, MigrateError, Result};

/// Single SQLite connection. An in-memory database lives exactly as long as
/// this value.
pub struct SqliteConnection {
    conn: Mutex<SqlxConnection>,
}

impl SqliteConnection {
    /// Open (creating if missing) the database file, or `:memory:`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let opts = if config.database == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| MigrateError::connection("sqlite3", e))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database)
                .create_if_missing(true)
        };

        let conn = opts
            .connect()
            .await
            .map_err(|e| MigrateError::connection("sqlite3", e))?;

        info!("Opened SQLite database: {}", config.database);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn db_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => DbError::with_code(code.into_owned(), db.message()),
            None => DbError::new(db.message()),
        },
        other => DbError::new(other.to_string()),
    }
}

#[async_trait]
impl SchemaConnection for SqliteConnection {
    async fn execute(&self, sql: &str) -> std::result::Result<u64, DbError> {
        let mut conn = self.conn.lock().await;
        let conn: &mut SqlxConnection = &mut conn;
        let result = sqlx::Executor::execute(conn, sqlx::raw_sql(sql))
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn query_exists(&self, sql: &str, params: &[String]) -> std::result::Result<bool, DbError> {
        let mut conn = self.conn.lock().await;
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }
        let row = query.fetch_optional(&mut *conn).await.map_err(db_error)?;
        Ok(row.is_some())
    }

    async fn query_strings(
        &self,
        sql: &str,
        params: &[String],
    ) -> std::result::Result<Vec<String>, DbError> {
        let mut conn = self.conn.lock().await;
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }
        let rows = query.fetch_all(&mut *conn).await.map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(db_error))
            .collect()
    }

    fn driver_name(&self) -> &str {
        "sqlite3"
    }
}
