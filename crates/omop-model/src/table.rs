use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A source data row keyed by standardized header.
pub type SourceRow = BTreeMap<String, String>;

/// A value written to an OMOP record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Missing,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Render the value the way it is written to CSV output.
    pub fn render(&self) -> String {
        match self {
            CellValue::Integer(value) => value.to_string(),
            CellValue::Decimal(value) => value.to_string(),
            CellValue::Text(value) => value.clone(),
            CellValue::Missing => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

/// One output row destined for an OMOP table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    #[serde(rename = "_target_table")]
    pub target_table: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, CellValue>,
}

impl TargetRecord {
    pub fn new(target_table: impl Into<String>) -> Self {
        Self {
            target_table: target_table.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Text of a field, if present and not missing.
    pub fn get_str(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            CellValue::Missing => None,
            value => Some(value.render()),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.fields.insert(column.into(), value);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}
