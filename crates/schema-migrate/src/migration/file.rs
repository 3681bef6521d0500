//! YAML migration files.
//!
//! A file lists steps in run order:
//!
//! ```yaml
//! migrations:
//!   - id: create user table
//!     step:
//!       type: add_table
//!       name: user
//!       columns:
//!         - { name: id, column_type: big_int, is_primary_key: true, is_auto_increment: true }
//!         - { name: login, column_type: varchar, length: 190 }
//!   - id: add unique index user.login
//!     step:
//!       type: add_index
//!       table: user
//!       index: { cols: [login], kind: unique }
//! ```
//!
//! `condition` replaces a step's default condition; `unconditional: true`
//! removes it.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::core::catalog::normalize_db_type;
use crate::core::schema::{Column, Index, Table};
use crate::error::{MigrateError, Result};

use super::condition::Condition;
use super::steps::*;
use super::Migration;

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationFile {
    pub migrations: Vec<MigrationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationEntry {
    pub id: String,
    pub step: StepDef,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub unconditional: bool,
}

/// Declarative form of every step type.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDef {
    RawSql {
        #[serde(default)]
        sql: String,
        /// Per-dialect overrides keyed by driver name.
        #[serde(default)]
        dialects: BTreeMap<String, String>,
    },
    AddTable {
        name: String,
        columns: Vec<Column>,
    },
    DropTable {
        table: String,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    RemoveColumn {
        table: String,
        column: String,
    },
    AddIndex {
        table: String,
        index: Index,
    },
    DropIndex {
        table: String,
        index: Index,
    },
    RenameTable {
        from: String,
        to: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    CopyTableData {
        source: String,
        target: String,
        columns: Vec<ColumnPair>,
    },
    TableCharset {
        table: String,
        columns: Vec<Column>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnPair {
    pub target: String,
    pub source: String,
}

impl StepDef {
    pub fn build(self) -> Box<dyn Migration> {
        match self {
            StepDef::RawSql { sql, dialects } => {
                let raw = dialects
                    .into_iter()
                    .fold(RawSqlMigration::new(sql), |raw, (dialect, sql)| {
                        raw.set(&dialect, sql)
                    });
                Box::new(raw)
            }
            StepDef::AddTable { name, columns } => {
                Box::new(AddTableMigration::new(Table::new(name, columns)))
            }
            StepDef::DropTable { table } => Box::new(DropTableMigration::new(table)),
            StepDef::AddColumn { table, column } => {
                Box::new(AddColumnMigration::new(table, column))
            }
            StepDef::RemoveColumn { table, column } => {
                Box::new(RemoveColumnMigration::new(table, column))
            }
            StepDef::AddIndex { table, index } => Box::new(AddIndexMigration::new(table, index)),
            StepDef::DropIndex { table, index } => {
                Box::new(DropIndexMigration::new(table, index))
            }
            StepDef::RenameTable { from, to } => Box::new(RenameTableMigration::new(from, to)),
            StepDef::RenameColumn { table, from, to } => {
                Box::new(RenameColumnMigration::new(table, from, to))
            }
            StepDef::CopyTableData {
                source,
                target,
                columns,
            } => Box::new(CopyTableDataMigration::new(
                target,
                source,
                columns.into_iter().map(|p| (p.target, p.source)),
            )),
            StepDef::TableCharset { table, columns } => {
                Box::new(TableCharsetMigration::new(table, columns))
            }
        }
    }
}

impl MigrationEntry {
    /// The entry's id and its step, with any condition override applied.
    pub fn into_migration(self) -> (String, Box<dyn Migration>) {
        let mut migration = self.step.build();
        if self.condition.is_some() || self.unconditional {
            migration.set_condition(self.condition);
        }
        (self.id, migration)
    }
}

impl MigrationFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: MigrationFile = serde_yaml::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.migrations {
            if entry.id.is_empty() {
                return Err(MigrateError::Config("migration id must not be empty".into()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(MigrateError::Config(format!(
                    "duplicate migration id '{}'",
                    entry.id
                )));
            }
            if let StepDef::RawSql { dialects, .. } = &entry.step {
                if let Some(unknown) = dialects
                    .keys()
                    .find(|k| *k != "default" && normalize_db_type(k).is_none())
                {
                    return Err(MigrateError::Config(format!(
                        "migration '{}': unknown dialect '{}'",
                        entry.id, unknown
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn into_migrations(self) -> Vec<(String, Box<dyn Migration>)> {
        self.migrations
            .into_iter()
            .map(MigrationEntry::into_migration)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::DialectImpl;

    const FILE: &str = r#"
migrations:
  - id: create user table
    step:
      type: add_table
      name: user
      columns:
        - { name: id, column_type: big_int, is_primary_key: true, is_auto_increment: true }
        - { name: login, column_type: varchar, length: 190 }
        - { name: is_admin, column_type: bool, default: "0" }
  - id: add unique index user.login
    step:
      type: add_index
      table: user
      index: { cols: [login], kind: unique }
  - id: backfill
    step:
      type: raw_sql
      sql: UPDATE user SET is_admin = 0;
      dialects:
        pg: UPDATE "user" SET is_admin = FALSE;
  - id: always add theme
    unconditional: true
    step:
      type: add_column
      table: user
      column: { name: theme, column_type: varchar, length: 30, nullable: true }
  - id: drop legacy
    condition: { kind: table_exists, table: user_v1 }
    step:
      type: drop_table
      table: user_v1
"#;

    #[test]
    fn test_parse_and_render() {
        let migrations = MigrationFile::from_yaml(FILE).unwrap().into_migrations();
        assert_eq!(migrations.len(), 5);

        let sqlite = DialectImpl::from_driver_name("sqlite3").unwrap();
        let (id, create) = &migrations[0];
        assert_eq!(id, "create user table");
        let sql = create.sql(&sqlite);
        assert!(sql.contains("`id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"));
        assert!(sql.contains("`is_admin` INTEGER NOT NULL DEFAULT 0"));

        assert_eq!(
            migrations[1].1.sql(&sqlite),
            "CREATE UNIQUE INDEX `UQE_user_login` ON `user` (`login`);"
        );

        let pg = DialectImpl::from_driver_name("postgres").unwrap();
        assert_eq!(migrations[2].1.sql(&pg), "UPDATE \"user\" SET is_admin = FALSE;");
        assert_eq!(migrations[2].1.sql(&sqlite), "UPDATE user SET is_admin = 0;");
    }

    #[test]
    fn test_condition_overrides() {
        let migrations = MigrationFile::from_yaml(FILE).unwrap().into_migrations();
        assert!(matches!(
            migrations[1].1.condition(),
            Some(Condition::IndexNotExists { .. })
        ));
        assert!(migrations[3].1.condition().is_none());
        assert_eq!(
            migrations[4].1.condition(),
            Some(&Condition::table_exists("user_v1"))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
migrations:
  - { id: a, step: { type: drop_table, table: t } }
  - { id: a, step: { type: drop_table, table: u } }
"#;
        let err = MigrationFile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate migration id 'a'"));
    }

    #[test]
    fn test_unknown_raw_sql_dialect_rejected() {
        let yaml = r#"
migrations:
  - id: a
    step: { type: raw_sql, dialects: { oracle: "SELECT 1 FROM dual" } }
"#;
        assert!(matches!(
            MigrationFile::from_yaml(yaml),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_step_type_is_yaml_error() {
        let yaml = "migrations:\n  - { id: a, step: { type: truncate, table: t } }\n";
        assert!(matches!(
            MigrationFile::from_yaml(yaml),
            Err(MigrateError::Yaml(_))
        ));
    }
}
