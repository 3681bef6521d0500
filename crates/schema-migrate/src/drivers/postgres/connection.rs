//! PostgreSQL schema connection over tokio-postgres.

use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::core::traits::SchemaConnection;
use crate::error::{DbError, MigrateError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Single tokio-postgres client driving DDL and catalog queries.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    /// Connect and verify the session with `SELECT 1`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.effective_port());
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.connect_timeout(CONNECT_TIMEOUT);

        if config.ssl_mode.eq_ignore_ascii_case("prefer") {
            warn!("PostgreSQL TLS is not available. Credentials will be transmitted in plaintext.");
        }

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| MigrateError::connection("postgres", e))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection("postgres", e))?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self { client })
    }
}

fn db_error(e: tokio_postgres::Error) -> DbError {
    match e.as_db_error() {
        Some(db) => DbError::with_code(db.code().code(), db.message()),
        None => DbError::new(e.to_string()),
    }
}

fn bind(params: &[String]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl SchemaConnection for PostgresConnection {
    async fn execute(&self, sql: &str) -> std::result::Result<u64, DbError> {
        let messages = self.client.simple_query(sql).await.map_err(db_error)?;
        let affected = messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum();
        Ok(affected)
    }

    async fn query_exists(&self, sql: &str, params: &[String]) -> std::result::Result<bool, DbError> {
        let rows = self.client.query(sql, &bind(params)).await.map_err(db_error)?;
        Ok(!rows.is_empty())
    }

    async fn query_strings(
        &self,
        sql: &str,
        params: &[String],
    ) -> std::result::Result<Vec<String>, DbError> {
        let rows = self.client.query(sql, &bind(params)).await.map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(db_error))
            .collect()
    }

    fn driver_name(&self) -> &str {
        "postgres"
    }
}
