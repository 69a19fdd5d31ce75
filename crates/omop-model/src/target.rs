use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::DeclaredType;
use crate::mapping::TargetField;

/// Which column of the mapping spreadsheet a source hint came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    #[default]
    Exact,
    NonExact,
}

/// Declares the intended source of one OMOP field.
///
/// The hints are free text copied from the mapping sheet and may not
/// match any catalog entry verbatim; resolving them is the reconciler's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFieldSpec {
    pub target_table: String,
    pub target_column: String,
    #[serde(default)]
    pub source_table_hint: String,
    #[serde(default)]
    pub source_column_hint: String,
    #[serde(default)]
    pub hint_kind: HintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TargetFieldSpec {
    pub fn new(
        target_table: impl Into<String>,
        target_column: impl Into<String>,
        source_table_hint: impl Into<String>,
        source_column_hint: impl Into<String>,
    ) -> Self {
        Self {
            target_table: target_table.into(),
            target_column: target_column.into(),
            source_table_hint: source_table_hint.into(),
            source_column_hint: source_column_hint.into(),
            hint_kind: HintKind::Exact,
            description: None,
        }
    }

    #[must_use]
    pub fn with_hint_kind(mut self, kind: HintKind) -> Self {
        self.hint_kind = kind;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when the row names no source at all.
    pub fn has_hint(&self) -> bool {
        !self.source_table_hint.trim().is_empty() || !self.source_column_hint.trim().is_empty()
    }
}

/// The full target schema: every field spec in spreadsheet order.
///
/// A target field may appear several times when the spreadsheet lists more
/// than one source hint for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSchema {
    specs: Vec<TargetFieldSpec>,
}

impl TargetSchema {
    pub fn new(specs: Vec<TargetFieldSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[TargetFieldSpec] {
        &self.specs
    }

    pub fn into_specs(self) -> Vec<TargetFieldSpec> {
        self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Distinct target fields in first-appearance order.
    pub fn fields(&self) -> Vec<TargetField> {
        let mut seen = HashSet::new();
        self.specs
            .iter()
            .map(|spec| TargetField::new(&spec.target_table, &spec.target_column))
            .filter(|field| seen.insert(field.clone()))
            .collect()
    }

    /// Distinct target tables in first-appearance order.
    pub fn tables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.specs
            .iter()
            .map(|spec| spec.target_table.as_str())
            .filter(|table| seen.insert(*table))
            .collect()
    }
}

/// Value shape an OMOP column expects, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Decimal,
    Date,
    Datetime,
    Text,
}

const DECIMAL_MARKERS: &[&str] = &[
    "value_as_number",
    "quantity",
    "amount",
    "range_low",
    "range_high",
];

impl ValueKind {
    /// `*_id` columns hold integers, `*_date` and `*_datetime` columns hold
    /// dates, and measurement value columns hold decimals.
    pub fn for_column(column: &str) -> Self {
        let lower = column.trim().to_ascii_lowercase();
        if lower.ends_with("_id") {
            ValueKind::Integer
        } else if lower.ends_with("_datetime") {
            ValueKind::Datetime
        } else if lower.ends_with("_date") {
            ValueKind::Date
        } else if DECIMAL_MARKERS.iter().any(|marker| lower.contains(marker)) {
            ValueKind::Decimal
        } else {
            ValueKind::Text
        }
    }

    /// Whether a source column of `declared` type can supply this kind.
    ///
    /// Unknown declared types are given the benefit of the doubt.
    pub fn accepts(&self, declared: &DeclaredType) -> bool {
        match (self, declared) {
            (_, DeclaredType::Other(_) | DeclaredType::Varchar) | (ValueKind::Text, _) => true,
            (ValueKind::Integer, DeclaredType::Integer) => true,
            (ValueKind::Decimal, DeclaredType::Integer | DeclaredType::Decimal) => true,
            (ValueKind::Date | ValueKind::Datetime, DeclaredType::Date | DeclaredType::Datetime) => {
                true
            }
            _ => false,
        }
    }
}
