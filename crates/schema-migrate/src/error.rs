//! Error types for the migration engine.

use std::fmt;
use thiserror::Error;

/// Driver-neutral database error.
///
/// Every connection adapter converts its native error into this shape so the
/// dialect error-code tables can classify it without knowing the driver.
/// `code` holds the native code as text: a SQLSTATE for PostgreSQL, the
/// numeric server error for MySQL and SQL Server, the extended result code
/// for SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbError {
    code: Option<String>,
    message: String,
}

impl DbError {
    /// Create an error without a native code (I/O failures, protocol errors).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create an error carrying the server's native error code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DbError {}

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, duplicate ids, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No dialect is registered for the driver name
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Could not open a session to the database
    #[error("Connection to {dialect} failed: {message}")]
    Connection { dialect: String, message: String },

    /// The catalog query behind a step's condition failed
    #[error("Condition check failed for migration '{id}'")]
    Condition {
        id: String,
        #[source]
        source: DbError,
    },

    /// A rendered statement failed at the database
    #[error("Migration '{id}' failed on {dialect}\n  SQL: {sql}")]
    Execution {
        id: String,
        dialect: String,
        sql: String,
        #[source]
        source: DbError,
    },

    /// Schema reset failed part way
    #[error("Clean database failed at statement: {statement}")]
    CleanDb {
        statement: String,
        #[source]
        source: DbError,
    },

    /// Reading or writing the migration log failed
    #[error("Migration log error")]
    Log {
        #[source]
        source: DbError,
    },

    /// Database error outside a migration step
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was cancelled before the named migration started
    #[error("Migration run cancelled before '{0}'")]
    Cancelled(String),
}

impl MigrateError {
    /// Create an Execution error for a failed step.
    pub fn execution(
        id: impl Into<String>,
        dialect: impl Into<String>,
        sql: impl Into<String>,
        source: DbError,
    ) -> Self {
        MigrateError::Execution {
            id: id.into(),
            dialect: dialect.into(),
            sql: sql.into(),
            source,
        }
    }

    /// Create a Connection error.
    pub fn connection(dialect: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Connection {
            dialect: dialect.into(),
            message: message.to_string(),
        }
    }

    /// The underlying database error, if this error came from the database.
    ///
    /// Pair with `Dialect::is_deadlock` or `Dialect::is_unique_constraint_violation`
    /// to decide between retrying and failing fast.
    pub fn db_error(&self) -> Option<&DbError> {
        match self {
            MigrateError::Condition { source, .. }
            | MigrateError::Execution { source, .. }
            | MigrateError::CleanDb { source, .. }
            | MigrateError::Log { source } => Some(source),
            MigrateError::Database(e) => Some(e),
            _ => None,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_)
            | MigrateError::UnsupportedDialect(_)
            | MigrateError::Yaml(_)
            | MigrateError::Json(_) => 1,
            MigrateError::Connection { .. } => 2,
            MigrateError::Condition { .. }
            | MigrateError::Execution { .. }
            | MigrateError::Log { .. }
            | MigrateError::Database(_) => 3,
            MigrateError::CleanDb { .. } => 4,
            MigrateError::Cancelled(_) => 5,
            MigrateError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_display_includes_code() {
        let err = DbError::with_code("23505", "duplicate key value");
        assert_eq!(err.to_string(), "[23505] duplicate key value");
        assert_eq!(DbError::new("broken pipe").to_string(), "broken pipe");
    }

    #[test]
    fn test_format_detailed_walks_source_chain() {
        let err = MigrateError::execution(
            "create user table",
            "postgres",
            "CREATE TABLE \"user\" ()",
            DbError::with_code("42601", "syntax error"),
        );
        let detailed = err.format_detailed();
        assert!(detailed.contains("Migration 'create user table' failed on postgres"));
        assert!(detailed.contains("Caused by:\n  1: [42601] syntax error"));
    }

    #[test]
    fn test_db_error_accessor() {
        let err = MigrateError::CleanDb {
            statement: "DROP SCHEMA public CASCADE;".into(),
            source: DbError::with_code("2BP01", "cannot drop"),
        };
        assert_eq!(err.db_error().and_then(|e| e.code()), Some("2BP01"));
        assert!(MigrateError::Config("x".into()).db_error().is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("bad".into()).exit_code(), 1);
        assert_eq!(MigrateError::connection("mysql", "refused").exit_code(), 2);
        assert_eq!(MigrateError::Cancelled("m1".into()).exit_code(), 5);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(MigrateError::from(io).exit_code(), 7);
    }
}
