//! Persisted form of a field mapping.
//!
//! Entries are grouped by target table and column so that the file reads like
//! the mapping spreadsheet it was derived from. Unmapped entries are kept with
//! empty source names so that loading restores every entry.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use omop_model::{FieldMapping, MappingEntry, MatchConfidence, SourceField, TargetField};

pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBinding {
    pub source_table: String,
    pub source_column: String,
    pub confidence: MatchConfidence,
}

/// target table → target column → bindings, in entry order within a column.
pub type GroupedMapping = BTreeMap<String, BTreeMap<String, Vec<SourceBinding>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default = "default_version")]
    pub version: String,
    /// RFC 3339 timestamp of when the document was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mapping: GroupedMapping,
    #[serde(default)]
    pub unclaimed_source_fields: Vec<SourceField>,
    #[serde(default)]
    pub unmatched_target_fields: Vec<TargetField>,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl MappingDocument {
    /// Build a document stamped with the current time.
    pub fn from_mapping(mapping: &FieldMapping) -> Self {
        let mut grouped = GroupedMapping::new();
        for entry in &mapping.entries {
            grouped
                .entry(entry.target_table.clone())
                .or_default()
                .entry(entry.target_column.clone())
                .or_default()
                .push(SourceBinding {
                    source_table: entry.source_table.clone(),
                    source_column: entry.source_column.clone(),
                    confidence: entry.match_confidence,
                });
        }
        Self {
            version: default_version(),
            generated_at: Some(Utc::now().to_rfc3339()),
            description: None,
            mapping: grouped,
            unclaimed_source_fields: mapping.unclaimed_source_fields.clone(),
            unmatched_target_fields: mapping.unmatched_target_fields.clone(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rebuild the mapping. Entries come back ordered by target table and column.
    pub fn to_mapping(&self) -> FieldMapping {
        let mut entries = Vec::new();
        for (target_table, columns) in &self.mapping {
            for (target_column, bindings) in columns {
                for binding in bindings {
                    let entry = if binding.confidence == MatchConfidence::Unmapped
                        || binding.source_column.is_empty()
                    {
                        MappingEntry::unmapped(target_table, target_column)
                    } else {
                        MappingEntry::mapped(
                            target_table,
                            target_column,
                            &binding.source_table,
                            &binding.source_column,
                            binding.confidence,
                        )
                    };
                    entries.push(entry);
                }
            }
        }
        FieldMapping {
            entries,
            unclaimed_source_fields: self.unclaimed_source_fields.clone(),
            unmatched_target_fields: self.unmatched_target_fields.clone(),
        }
    }
}
