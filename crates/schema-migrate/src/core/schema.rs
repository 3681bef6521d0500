//! Dialect-agnostic schema model: column types, columns, indexes, tables.
//!
//! These types describe what a migration wants to exist. Dialects read them
//! to render DDL; the engine never mutates them except for index name
//! backfill, which is done on an owned copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MigrateError;

/// Semantic column type.
///
/// Each dialect maps every variant to a native type, collapsing sizes and
/// synonyms it does not distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bit,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    Integer,
    BigInt,
    Serial,
    BigSerial,
    Decimal,
    Numeric,
    Real,
    Float,
    Double,
    Char,
    Varchar,
    NVarchar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Bytea,
    Date,
    Time,
    DateTime,
    TimeStamp,
    TimeStampz,
    Bool,
    Uuid,
    Json,
}

impl ColumnType {
    /// Every variant, in declaration order.
    pub const ALL: [ColumnType; 36] = [
        ColumnType::Bit,
        ColumnType::TinyInt,
        ColumnType::SmallInt,
        ColumnType::MediumInt,
        ColumnType::Int,
        ColumnType::Integer,
        ColumnType::BigInt,
        ColumnType::Serial,
        ColumnType::BigSerial,
        ColumnType::Decimal,
        ColumnType::Numeric,
        ColumnType::Real,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::Char,
        ColumnType::Varchar,
        ColumnType::NVarchar,
        ColumnType::TinyText,
        ColumnType::Text,
        ColumnType::MediumText,
        ColumnType::LongText,
        ColumnType::Binary,
        ColumnType::VarBinary,
        ColumnType::TinyBlob,
        ColumnType::Blob,
        ColumnType::MediumBlob,
        ColumnType::LongBlob,
        ColumnType::Bytea,
        ColumnType::Date,
        ColumnType::Time,
        ColumnType::DateTime,
        ColumnType::TimeStamp,
        ColumnType::TimeStampz,
        ColumnType::Bool,
        ColumnType::Uuid,
        ColumnType::Json,
    ];

    /// Canonical upper-case type name.
    ///
    /// Dialects that keep a type as-is render this name directly.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Bit => "BIT",
            ColumnType::TinyInt => "TINYINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::MediumInt => "MEDIUMINT",
            ColumnType::Int => "INT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Serial => "SERIAL",
            ColumnType::BigSerial => "BIGSERIAL",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Real => "REAL",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Char => "CHAR",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::NVarchar => "NVARCHAR",
            ColumnType::TinyText => "TINYTEXT",
            ColumnType::Text => "TEXT",
            ColumnType::MediumText => "MEDIUMTEXT",
            ColumnType::LongText => "LONGTEXT",
            ColumnType::Binary => "BINARY",
            ColumnType::VarBinary => "VARBINARY",
            ColumnType::TinyBlob => "TINYBLOB",
            ColumnType::Blob => "BLOB",
            ColumnType::MediumBlob => "MEDIUMBLOB",
            ColumnType::LongBlob => "LONGBLOB",
            ColumnType::Bytea => "BYTEA",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "DATETIME",
            ColumnType::TimeStamp => "TIMESTAMP",
            ColumnType::TimeStampz => "TIMESTAMPZ",
            ColumnType::Bool => "BOOL",
            ColumnType::Uuid => "UUID",
            ColumnType::Json => "JSON",
        }
    }

    /// Types whose name alone declares an auto-increment column.
    pub fn implies_auto_increment(&self) -> bool {
        matches!(self, ColumnType::Serial | ColumnType::BigSerial)
    }

    /// Character types (used for charset clauses).
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ColumnType::Char
                | ColumnType::Varchar
                | ColumnType::NVarchar
                | ColumnType::TinyText
                | ColumnType::Text
                | ColumnType::MediumText
                | ColumnType::LongText
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = MigrateError;

    /// Parse a type name case-insensitively. Accepts the canonical names plus
    /// `BOOLEAN` and `TIMESTAMPTZ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let alias = match upper.as_str() {
            "BOOLEAN" => Some(ColumnType::Bool),
            "TIMESTAMPTZ" => Some(ColumnType::TimeStampz),
            _ => None,
        };
        alias
            .or_else(|| ColumnType::ALL.iter().copied().find(|t| t.name() == upper))
            .ok_or_else(|| MigrateError::Config(format!("Unknown column type: {}", s)))
    }
}

/// A column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    /// First size parameter; 0 means none.
    #[serde(default)]
    pub length: u32,
    /// Second size parameter (scale); 0 means none.
    #[serde(default)]
    pub length2: u32,
    #[serde(default)]
    pub nullable: bool,
    /// Raw default expression, rendered through `Dialect::default_value`.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
}

impl Column {
    /// A NOT NULL column with no size, default or key flags.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: 0,
            length2: 0,
            nullable: false,
            default: None,
            is_primary_key: false,
            is_auto_increment: false,
            unique: false,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Set both size parameters, e.g. `DECIMAL(10,2)`.
    pub fn precision(mut self, length: u32, length2: u32) -> Self {
        self.length = length;
        self.length2 = length2;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Copy of this column with type-implied flags applied.
    ///
    /// SERIAL and BIGSERIAL are always auto-increment and never nullable.
    /// The receiver is left untouched, so one column value can be shared by
    /// several steps.
    pub fn normalized(&self) -> Column {
        let mut col = self.clone();
        if col.column_type.implies_auto_increment() {
            col.is_auto_increment = true;
            col.nullable = false;
        }
        col
    }

    /// `(length)`, `(length,length2)` or empty.
    pub fn length_suffix(&self) -> String {
        if self.length2 > 0 {
            format!("({},{})", self.length, self.length2)
        } else if self.length > 0 {
            format!("({})", self.length)
        } else {
            String::new()
        }
    }
}

/// Index uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    #[default]
    Index,
    Unique,
}

const INDEX_PREFIX: &str = "IDX_";
const UNIQUE_PREFIX: &str = "UQE_";

/// An index over an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Explicit name; empty means derived from the columns.
    #[serde(default)]
    pub name: String,
    pub cols: Vec<String>,
    #[serde(default)]
    pub kind: IndexKind,
}

impl Index {
    pub fn new<I, S>(cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: String::new(),
            cols: cols.into_iter().map(Into::into).collect(),
            kind: IndexKind::Index,
        }
    }

    pub fn unique<I, S>(cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: IndexKind::Unique,
            ..Self::new(cols)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name part before prefixing: the explicit name, or the columns joined by `_`.
    pub fn base_name(&self) -> String {
        if self.name.is_empty() {
            self.cols.join("_")
        } else {
            self.name.clone()
        }
    }

    /// Identifier the index has in the database.
    ///
    /// `IDX_<table>_<name>` for plain indexes, `UQE_<table>_<name>` for unique
    /// ones. A name that already carries either prefix is used verbatim.
    pub fn x_name(&self, table: &str) -> String {
        let name = self.base_name();
        if name.starts_with(INDEX_PREFIX) || name.starts_with(UNIQUE_PREFIX) {
            return name;
        }
        match self.kind {
            IndexKind::Unique => format!("{}{}_{}", UNIQUE_PREFIX, table, name),
            IndexKind::Index => format!("{}{}_{}", INDEX_PREFIX, table, name),
        }
    }

    /// Copy with `name` filled from the column list when it was empty.
    pub fn with_backfilled_name(mut self) -> Self {
        if self.name.is_empty() {
            self.name = self.cols.join("_");
        }
        self
    }
}

/// A table declaration.
///
/// `primary_keys` and `uniques` are computed once in [`Table::new`] from the
/// column flags. Later edits to `columns` do not update them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<String>,
    pub uniques: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let primary_keys = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        let uniques = columns
            .iter()
            .filter(|c| c.unique)
            .map(|c| c.name.clone())
            .collect();
        Self {
            name: name.into(),
            columns,
            primary_keys,
            uniques,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_parse() {
        assert_eq!("varchar".parse::<ColumnType>().unwrap(), ColumnType::Varchar);
        assert_eq!("BigSerial".parse::<ColumnType>().unwrap(), ColumnType::BigSerial);
        assert_eq!("boolean".parse::<ColumnType>().unwrap(), ColumnType::Bool);
        assert_eq!("timestamptz".parse::<ColumnType>().unwrap(), ColumnType::TimeStampz);
        assert!("geometry".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_every_type_round_trips_through_name() {
        for t in ColumnType::ALL {
            assert_eq!(t.name().parse::<ColumnType>().unwrap(), t);
        }
    }

    #[test]
    fn test_length_suffix() {
        let c = Column::new("v", ColumnType::Varchar);
        assert_eq!(c.length_suffix(), "");
        assert_eq!(c.clone().length(50).length_suffix(), "(50)");
        assert_eq!(c.precision(10, 2).length_suffix(), "(10,2)");
    }

    #[test]
    fn test_normalized_serial_leaves_original_untouched() {
        let col = Column::new("id", ColumnType::Serial).nullable(true);
        let norm = col.normalized();
        assert!(norm.is_auto_increment);
        assert!(!norm.nullable);
        assert!(!col.is_auto_increment);
        assert!(col.nullable);
        // applying twice is stable
        assert_eq!(norm.normalized(), norm);
    }

    #[test]
    fn test_index_x_name() {
        let idx = Index::new(["org_id", "login"]);
        assert_eq!(idx.x_name("user"), "IDX_user_org_id_login");

        let uq = Index::unique(["email"]);
        assert_eq!(uq.x_name("user"), "UQE_user_email");

        let named = Index::new(["a"]).named("by_a");
        assert_eq!(named.x_name("t"), "IDX_t_by_a");

        let prefixed = Index::unique(["a"]).named("UQE_custom");
        assert_eq!(prefixed.x_name("t"), "UQE_custom");
    }

    #[test]
    fn test_backfilled_name_keeps_x_name_stable() {
        let idx = Index::new(["org_id", "login"]);
        let filled = idx.clone().with_backfilled_name();
        assert_eq!(filled.name, "org_id_login");
        assert_eq!(filled.x_name("user"), idx.x_name("user"));
    }

    #[test]
    fn test_table_snapshots_keys_at_construction() {
        let mut table = Table::new(
            "user",
            vec![
                Column::new("id", ColumnType::BigInt).primary_key().auto_increment(),
                Column::new("login", ColumnType::Varchar).length(190).unique(),
                Column::new("email", ColumnType::Varchar).length(190),
            ],
        );
        assert_eq!(table.primary_keys, vec!["id"]);
        assert_eq!(table.uniques, vec!["login"]);

        table.columns[2].unique = true;
        assert_eq!(table.uniques, vec!["login"]);
        assert!(table.column("email").is_some());
    }
}
