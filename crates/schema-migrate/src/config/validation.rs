//! Configuration validation.

use super::Config;
use crate::core::catalog::normalize_db_type;
use crate::core::identifier::validate_identifier;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let db = &config.database;

    let Some(kind) = normalize_db_type(&db.r#type) else {
        return Err(MigrateError::UnsupportedDialect(db.r#type.clone()));
    };

    if db.database.is_empty() {
        return Err(MigrateError::Config("database.database is required".into()));
    }

    // SQLite is file based; everything else is a network server.
    if kind != "sqlite3" {
        if db.host.is_empty() {
            return Err(MigrateError::Config("database.host is required".into()));
        }
        if db.user.is_empty() {
            return Err(MigrateError::Config("database.user is required".into()));
        }
    }

    match db.ssl_mode.to_lowercase().as_str() {
        "disable" | "prefer" => {}
        "require" if kind == "mssql" => {}
        "require" => {
            return Err(MigrateError::Config(format!(
                "database.ssl_mode 'require' is only supported for mssql, not {}",
                kind
            )));
        }
        other => {
            return Err(MigrateError::Config(format!(
                "database.ssl_mode must be disable, prefer or require, got '{}'",
                other
            )));
        }
    }

    validate_identifier(&config.migrator.log_table)
        .map_err(|e| MigrateError::Config(format!("migrator.log_table: {}", e)))?;

    Ok(())
}
