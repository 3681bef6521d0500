//! Microsoft SQL Server driver.
//!
//! - [`MssqlDialect`]: SQL syntax strategy for MSSQL
//! - [`MssqlConnection`]: live schema connection via tiberius

mod connection;
mod dialect;

pub use connection::MssqlConnection;
pub use dialect::MssqlDialect;
