//! Migration steps and the conditions that guard them.
//!
//! A step is a dialect-independent intent that renders to exactly one SQL
//! statement (or batch) for a given [`Dialect`]. Steps carry a caller-assigned
//! id for the migration log and an optional [`Condition`]; a step whose
//! condition evaluates false is skipped.

mod condition;
mod file;
mod steps;

pub use condition::Condition;
pub use file::{ColumnPair, MigrationEntry, MigrationFile, StepDef};
pub use steps::{
    AddColumnMigration, AddIndexMigration, AddTableMigration, CopyTableDataMigration,
    DropIndexMigration, DropTableMigration, RawSqlMigration, RemoveColumnMigration,
    RenameColumnMigration, RenameTableMigration, TableCharsetMigration,
};

use crate::core::traits::Dialect;

/// Id and condition shared by every step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationBase {
    pub id: String,
    pub condition: Option<Condition>,
}

impl MigrationBase {
    pub fn with_condition(condition: Condition) -> Self {
        Self {
            id: String::new(),
            condition: Some(condition),
        }
    }
}

/// A renderable migration step.
pub trait Migration: Send + Sync {
    fn base(&self) -> &MigrationBase;

    fn base_mut(&mut self) -> &mut MigrationBase;

    /// Render the step for `dialect`. Never fails: missing optional data
    /// renders as an empty segment.
    fn sql(&self, dialect: &dyn Dialect) -> String;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn set_id(&mut self, id: String) {
        self.base_mut().id = id;
    }

    fn condition(&self) -> Option<&Condition> {
        self.base().condition.as_ref()
    }

    /// Replace the step's condition; `None` makes it unconditional.
    fn set_condition(&mut self, condition: Option<Condition>) {
        self.base_mut().condition = condition;
    }

    fn with_condition(mut self, condition: Option<Condition>) -> Self
    where
        Self: Sized,
    {
        self.set_condition(condition);
        self
    }
}
