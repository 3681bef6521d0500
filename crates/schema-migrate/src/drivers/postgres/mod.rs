//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL
//! - [`PostgresConnection`]: live schema connection via tokio-postgres

mod connection;
mod dialect;

pub use connection::PostgresConnection;
pub use dialect::PostgresDialect;
