//! Core abstractions for dialect-aware schema migration.
//!
//! - [`schema`]: column, index and table declarations
//! - [`identifier`]: identifier validation and quoting helpers
//! - [`traits`]: the `Dialect` contract and the `SchemaConnection` seam
//! - [`catalog`]: driver-name resolution and session factory
//!
//! # Architecture
//!
//! The core module defines database-agnostic abstractions that are implemented
//! by driver modules (`drivers/postgres`, `drivers/mssql`, etc.). Steps and
//! conditions depend only on these types, never on a concrete driver.

pub mod catalog;
pub mod identifier;
pub mod schema;
pub mod traits;

// Re-export commonly used types for convenience
pub use schema::{Column, ColumnType, Index, IndexKind, Table};
pub use traits::{
    AutoIncrKey, CheckQuery, CleanPlan, Dialect, ErrorClass, ErrorCodes, SchemaConnection,
};
