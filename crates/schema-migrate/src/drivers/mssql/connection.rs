//! SQL Server schema connection over tiberius.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::core::traits::SchemaConnection;
use crate::error::{DbError, MigrateError, Result};

/// Single tiberius client. Tiberius needs `&mut` for every call, so the
/// client sits behind an async mutex.
pub struct MssqlConnection {
    client: Mutex<Client<Compat<TcpStream>>>,
}

impl MssqlConnection {
    fn build_config(config: &DatabaseConfig) -> Config {
        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.effective_port());
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));

        match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("MSSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                tds.encryption(EncryptionLevel::NotSupported);
            }
            "prefer" => {
                tds.trust_cert();
                tds.encryption(EncryptionLevel::On);
            }
            _ => {
                tds.trust_cert();
                tds.encryption(EncryptionLevel::Required);
            }
        }
        tds
    }

    /// Open a TCP connection and log in.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let tds = Self::build_config(config);
        let tcp = TcpStream::connect(tds.get_addr())
            .await
            .map_err(|e| MigrateError::connection("mssql", e))?;
        tcp.set_nodelay(true).ok();

        let client = Client::connect(tds, tcp.compat_write())
            .await
            .map_err(|e| MigrateError::connection("mssql", e))?;

        info!(
            "Connected to MSSQL: {}:{}/{}",
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

fn db_error(e: tiberius::error::Error) -> DbError {
    match e {
        tiberius::error::Error::Server(token) => {
            DbError::with_code(token.code().to_string(), token.message())
        }
        other => DbError::new(other.to_string()),
    }
}

fn bind(params: &[String]) -> Vec<&dyn ToSql> {
    params.iter().map(|p| p as &dyn ToSql).collect()
}

#[async_trait]
impl SchemaConnection for MssqlConnection {
    async fn execute(&self, sql: &str) -> std::result::Result<u64, DbError> {
        let mut client = self.client.lock().await;
        let result = client.execute(sql, &[]).await.map_err(db_error)?;
        Ok(result.total())
    }

    async fn query_exists(&self, sql: &str, params: &[String]) -> std::result::Result<bool, DbError> {
        let mut client = self.client.lock().await;
        let stream = client.query(sql, &bind(params)).await.map_err(db_error)?;
        let row = stream.into_row().await.map_err(db_error)?;
        Ok(row.is_some())
    }

    async fn query_strings(
        &self,
        sql: &str,
        params: &[String],
    ) -> std::result::Result<Vec<String>, DbError> {
        let mut client = self.client.lock().await;
        let stream = client.query(sql, &bind(params)).await.map_err(db_error)?;
        let rows = stream.into_first_result().await.map_err(db_error)?;
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let value: Option<&str> = row.try_get(0).map_err(db_error)?;
            values.push(value.unwrap_or_default().to_string());
        }
        Ok(values)
    }

    fn driver_name(&self) -> &str {
        "mssql"
    }
}
