//! Driver catalog: maps configured driver names to a dialect and a live
//! connection.
//!
//! The set of backends is closed, so the catalog is a pair of functions
//! rather than a runtime registry. [`normalize_db_type`] is the single place
//! where driver-name aliases are resolved.

use std::sync::Arc;

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::drivers::{DialectImpl, MssqlConnection, PostgresConnection};
#[cfg(feature = "mysql")]
use crate::drivers::MysqlConnection;
#[cfg(feature = "sqlite")]
use crate::drivers::SqliteConnection;
use crate::error::Result;
use crate::session::SchemaSession;

use super::traits::{Dialect, SchemaConnection};

/// Canonical driver names and the aliases accepted for each.
pub const DRIVER_ALIASES: &[(&str, &[&str])] = &[
    ("postgres", &["postgresql", "pg"]),
    ("mysql", &["mariadb"]),
    ("sqlite3", &["sqlite"]),
    ("mssql", &["sqlserver", "sql_server"]),
];

/// Canonical driver name for `db_type`, or `None` if unsupported.
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn normalize_db_type(db_type: &str) -> Option<&'static str> {
    let wanted = db_type.trim().to_lowercase();
    DRIVER_ALIASES
        .iter()
        .find(|(name, aliases)| *name == wanted || aliases.contains(&wanted.as_str()))
        .map(|(name, _)| *name)
}

/// Open a connection for `config` and pair it with the matching dialect.
pub async fn open_session(config: &DatabaseConfig) -> Result<SchemaSession> {
    let dialect = DialectImpl::from_driver_name(&config.r#type)?;
    debug!("Opening {} session", dialect.name());

    let conn: Arc<dyn SchemaConnection> = match dialect {
        DialectImpl::Postgres(_) => Arc::new(PostgresConnection::connect(config).await?),
        DialectImpl::Mssql(_) => Arc::new(MssqlConnection::connect(config).await?),
        #[cfg(feature = "mysql")]
        DialectImpl::Mysql(_) => Arc::new(MysqlConnection::connect(config).await?),
        #[cfg(not(feature = "mysql"))]
        DialectImpl::Mysql(_) => {
            return Err(crate::error::MigrateError::Config(
                "MySQL support is not compiled in (enable the 'mysql' feature)".into(),
            ))
        }
        #[cfg(feature = "sqlite")]
        DialectImpl::Sqlite(_) => Arc::new(SqliteConnection::connect(config).await?),
        #[cfg(not(feature = "sqlite"))]
        DialectImpl::Sqlite(_) => {
            return Err(crate::error::MigrateError::Config(
                "SQLite support is not compiled in (enable the 'sqlite' feature)".into(),
            ))
        }
    };

    Ok(SchemaSession::new(dialect, conn))
}
