//! Configuration types.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the migrations run against.
    pub database: DatabaseConfig,

    /// Runner behavior.
    #[serde(default)]
    pub migrator: MigratorConfig,
}

/// Connection settings for the target database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver name: postgres, mysql, sqlite3 or mssql (aliases accepted).
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host. Unused for SQLite.
    #[serde(default)]
    pub host: String,

    /// Database port (default: the driver's standard port).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name, or the file path for SQLite (`:memory:` allowed).
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// TLS mode: disable, prefer or require (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl DatabaseConfig {
    /// Configured port, or the standard port for the driver.
    pub fn effective_port(&self) -> u16 {
        if let Some(port) = self.port {
            return port;
        }
        match crate::core::catalog::normalize_db_type(&self.r#type) {
            Some("mysql") => 3306,
            Some("mssql") => 1433,
            _ => 5432,
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratorConfig {
    /// Table recording applied migrations (default: "migration_log").
    #[serde(default = "default_log_table")]
    pub log_table: String,

    /// Permit the destructive clean-db command (default: false).
    #[serde(default)]
    pub allow_clean_db: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            log_table: default_log_table(),
            allow_clean_db: false,
        }
    }
}

fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_log_table() -> String {
    "migration_log".to_string()
}
