//! Source catalog types.
//!
//! The catalog enumerates the IHID tables and their columns exactly as the
//! catalog document spells them. Spelling variants of the same logical table
//! are kept apart here; they are reconciled at lookup time by the mapper.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Declared storage type of a catalog column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Integer,
    Varchar,
    Decimal,
    Boolean,
    Date,
    Datetime,
    /// Anything the catalog declares that is not recognized, kept verbatim.
    Other(String),
}

impl DeclaredType {
    /// Parse a catalog type string. Never fails: unknown spellings become `Other`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        // Strip length/precision suffixes such as VARCHAR(255) or DECIMAL(10,2).
        let base = trimmed
            .split_once('(')
            .map_or(trimmed, |(head, _)| head)
            .trim()
            .to_ascii_uppercase();
        match base.as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" => DeclaredType::Integer,
            "VARCHAR" | "NVARCHAR" | "CHAR" | "TEXT" | "STRING" => DeclaredType::Varchar,
            "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" | "NUMBER" => {
                DeclaredType::Decimal
            }
            "BOOL" | "BOOLEAN" | "BIT" => DeclaredType::Boolean,
            "DATE" => DeclaredType::Date,
            "DATETIME" | "TIMESTAMP" | "DATETIME2" => DeclaredType::Datetime,
            _ => DeclaredType::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeclaredType::Integer => "INTEGER",
            DeclaredType::Varchar => "VARCHAR",
            DeclaredType::Decimal => "DECIMAL",
            DeclaredType::Boolean => "BOOLEAN",
            DeclaredType::Date => "DATE",
            DeclaredType::Datetime => "DATETIME",
            DeclaredType::Other(raw) => raw.as_str(),
        }
    }

    /// Returns true for types whose values are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DeclaredType::Integer | DeclaredType::Decimal)
    }

    /// Returns true for date or date-time types.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DeclaredType::Date | DeclaredType::Datetime)
    }
}

impl Default for DeclaredType {
    fn default() -> Self {
        DeclaredType::Other(String::new())
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeclaredType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for DeclaredType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeclaredType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(DeclaredType::parse).unwrap_or_default())
    }
}

/// One column of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default)]
    pub declared_type: DeclaredType,
    #[serde(default)]
    pub explanation: String,
}

impl ColumnDescriptor {
    pub fn new(
        name: impl Into<String>,
        declared_type: DeclaredType,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableEntry {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Return the column with this exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Outcome of adding a column to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnInsert {
    Added,
    /// The table already declares a column with this name; the first one is kept.
    Duplicate,
}

/// In-memory catalog of source tables, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModel {
    tables: Vec<TableEntry>,
}

impl CatalogModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already grouped tables.
    ///
    /// Duplicate columns inside a table keep their first declaration.
    pub fn from_tables(tables: Vec<TableEntry>) -> Result<Self> {
        let mut catalog = Self::new();
        for table in tables {
            if table.table_name.trim().is_empty() {
                return Err(ModelError::EmptyTableName);
            }
            catalog.ensure_table(&table.table_name);
            for column in table.columns {
                catalog.push_column(&table.table_name, column)?;
            }
        }
        Ok(catalog)
    }

    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    /// Look up a table by its exact raw name.
    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|table| table.table_name == name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add a column under a raw table name, creating the table on first sight.
    pub fn push_column(&mut self, table_name: &str, column: ColumnDescriptor) -> Result<ColumnInsert> {
        if table_name.trim().is_empty() {
            return Err(ModelError::EmptyTableName);
        }
        if column.name.trim().is_empty() {
            return Err(ModelError::EmptyColumnName {
                table: table_name.to_string(),
            });
        }
        let index = self.ensure_table(table_name);
        let table = &mut self.tables[index];
        if table.has_column(&column.name) {
            return Ok(ColumnInsert::Duplicate);
        }
        table.columns.push(column);
        Ok(ColumnInsert::Added)
    }

    fn ensure_table(&mut self, table_name: &str) -> usize {
        if let Some(index) = self
            .tables
            .iter()
            .position(|table| table.table_name == table_name)
        {
            return index;
        }
        self.tables.push(TableEntry::new(table_name));
        self.tables.len() - 1
    }
}
