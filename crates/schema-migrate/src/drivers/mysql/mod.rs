//! MySQL/MariaDB database driver.
//!
//! - [`MysqlDialect`]: SQL syntax strategy, always available
//! - [`MysqlConnection`]: live schema connection via mysql_async
//!
//! # Feature Flag
//!
//! The connection is only compiled with the `mysql` feature:
//!
//! ```toml
//! [dependencies]
//! schema-migrate = { version = "0.3", features = ["mysql"] }
//! ```
//!
//! # Supported Versions
//!
//! - MySQL 8.0+ (`RENAME COLUMN` requires 8.0)
//! - MariaDB 10.5+

#[cfg(feature = "mysql")]
mod connection;
mod dialect;

#[cfg(feature = "mysql")]
pub use connection::MysqlConnection;
pub use dialect::MysqlDialect;
