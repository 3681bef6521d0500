//! SQLite driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy, always available
//! - [`SqliteConnection`]: live schema connection via sqlx (feature `sqlite`)

#[cfg(feature = "sqlite")]
mod connection;
mod dialect;

#[cfg(feature = "sqlite")]
pub use connection::SqliteConnection;
pub use dialect::SqliteDialect;
