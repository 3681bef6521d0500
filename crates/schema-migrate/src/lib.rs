//! # schema-migrate
//!
//! Dialect-aware database schema migrations.
//!
//! Schema changes are declared once as dialect-independent steps and
//! rendered to native SQL for PostgreSQL, MySQL, SQLite or SQL Server:
//!
//! - **Schema model** of columns, indexes and tables
//! - **Dialects** that render DDL and classify driver errors
//! - **Conditions** that make steps idempotent (column/index/table exists)
//! - **Runner** that applies steps in order and records them in a log table
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use schema_migrate::core::schema::{Column, ColumnType, Index, Table};
//! use schema_migrate::migration::{AddIndexMigration, AddTableMigration};
//! use schema_migrate::{open_session, Config, DbMigrationLog, Migrator};
//!
//! #[tokio::main]
//! async fn main() -> schema_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let session = open_session(&config.database).await?;
//!     let log = Arc::new(DbMigrationLog::new(config.migrator.log_table.clone()));
//!
//!     let mut migrator = Migrator::new(session, log);
//!     migrator.add_migration(
//!         "create user table",
//!         AddTableMigration::new(Table::new(
//!             "user",
//!             vec![
//!                 Column::new("id", ColumnType::BigInt).primary_key().auto_increment(),
//!                 Column::new("login", ColumnType::Varchar).length(190),
//!             ],
//!         )),
//!     )?;
//!     migrator.add_migration(
//!         "add unique index user.login",
//!         AddIndexMigration::new("user", Index::unique(["login"])),
//!     )?;
//!
//!     let summary = migrator.run(None).await?;
//!     println!("Applied {} migrations", summary.applied);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use crate::core::catalog::{normalize_db_type, open_session};
pub use crate::core::traits::{Dialect, SchemaConnection};
pub use config::{Config, DatabaseConfig, MigratorConfig};
pub use drivers::DialectImpl;
pub use error::{DbError, MigrateError, Result};
pub use migration::{Condition, Migration, MigrationFile};
pub use migrator::{DbMigrationLog, MemoryMigrationLog, MigrationLog, Migrator, RunSummary};
pub use session::SchemaSession;
