//! Field mapping types produced by the schema reconciler.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::normalize_table_name;

/// How a mapping entry's source was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidence {
    /// Table and column matched verbatim.
    Exact,
    /// Table or column needed normalization (separators, case, variant union).
    Normalized,
    /// Table only resolved through an alias or containment match.
    Fallback,
    /// Nothing in the catalog matched.
    Unmapped,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchConfidence::Exact => "EXACT",
            MatchConfidence::Normalized => "NORMALIZED",
            MatchConfidence::Fallback => "FALLBACK",
            MatchConfidence::Unmapped => "UNMAPPED",
        }
    }

    pub fn all() -> [MatchConfidence; 4] {
        [
            MatchConfidence::Exact,
            MatchConfidence::Normalized,
            MatchConfidence::Fallback,
            MatchConfidence::Unmapped,
        ]
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution of a single target field spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub target_table: String,
    pub target_column: String,
    /// Raw catalog table name; empty when unmapped.
    pub source_table: String,
    /// Catalog column name; empty when unmapped.
    pub source_column: String,
    pub match_confidence: MatchConfidence,
}

impl MappingEntry {
    pub fn mapped(
        target_table: impl Into<String>,
        target_column: impl Into<String>,
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        match_confidence: MatchConfidence,
    ) -> Self {
        Self {
            target_table: target_table.into(),
            target_column: target_column.into(),
            source_table: source_table.into(),
            source_column: source_column.into(),
            match_confidence,
        }
    }

    pub fn unmapped(target_table: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            target_table: target_table.into(),
            target_column: target_column.into(),
            source_table: String::new(),
            source_column: String::new(),
            match_confidence: MatchConfidence::Unmapped,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.match_confidence != MatchConfidence::Unmapped
    }

    pub fn source_field(&self) -> Option<SourceField> {
        self.is_mapped()
            .then(|| SourceField::new(&self.source_table, &self.source_column))
    }

    pub fn target_field(&self) -> TargetField {
        TargetField::new(&self.target_table, &self.target_column)
    }
}

/// A catalog column addressed by raw table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceField {
    pub table: String,
    pub column: String,
}

impl SourceField {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// An OMOP field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetField {
    pub table: String,
    pub column: String,
}

impl TargetField {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Complete reconciliation result.
///
/// `entries` holds exactly one entry per target field spec, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub entries: Vec<MappingEntry>,
    /// Catalog columns no mapped entry claimed (catalog order).
    #[serde(default)]
    pub unclaimed_source_fields: Vec<SourceField>,
    /// Target fields for which nothing resolved (spec order, deduplicated).
    #[serde(default)]
    pub unmatched_target_fields: Vec<TargetField>,
}

impl FieldMapping {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that resolved to a source column.
    pub fn mapped(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter().filter(|entry| entry.is_mapped())
    }

    /// Count entries at a given confidence.
    pub fn count_with(&self, confidence: MatchConfidence) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.match_confidence == confidence)
            .count()
    }

    /// Distinct target tables referenced by any entry, sorted.
    pub fn target_tables(&self) -> Vec<&str> {
        let tables: BTreeSet<&str> = self
            .entries
            .iter()
            .map(|entry| entry.target_table.as_str())
            .collect();
        tables.into_iter().collect()
    }

    /// Distinct raw source tables claimed by mapped entries, sorted.
    pub fn source_tables(&self) -> Vec<&str> {
        let tables: BTreeSet<&str> = self
            .mapped()
            .map(|entry| entry.source_table.as_str())
            .collect();
        tables.into_iter().collect()
    }

    /// Mapped entries whose source table is `table_name` or a spelling variant of it.
    pub fn entries_for_source_table(&self, table_name: &str) -> Vec<&MappingEntry> {
        let wanted = normalize_table_name(table_name);
        self.mapped()
            .filter(|entry| normalize_table_name(&entry.source_table) == wanted)
            .collect()
    }

    /// Mapped entries that bind a given target field.
    pub fn sources_for(&self, target_table: &str, target_column: &str) -> Vec<&MappingEntry> {
        self.mapped()
            .filter(|entry| {
                entry.target_table.eq_ignore_ascii_case(target_table)
                    && entry.target_column.eq_ignore_ascii_case(target_column)
            })
            .collect()
    }
}
