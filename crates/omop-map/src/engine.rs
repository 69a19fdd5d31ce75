//! Schema reconciler.
//!
//! Resolves every target field spec against the catalog through ordered tiers:
//! exact table name, normalized table name, then (optionally) alias and
//! containment fallback. Resolution is deterministic; fuzzy similarity is only
//! used to suggest a table in diagnostics.

use std::collections::HashSet;

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;

use omop_model::{
    CatalogModel, Diagnostic, DiagnosticCode, FieldMapping, MappingEntry, MatchConfidence,
    Severity, SourceField, TableEntry, TargetField, TargetFieldSpec,
};

use crate::aliases::TableAliases;
use crate::index::{CatalogIndex, LogicalTable, find_in_entry};
use crate::normalize::{contains_either, normalize_table_name};

/// Minimum similarity for a "closest table" suggestion.
const SUGGESTION_MIN_SIMILARITY: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Try table aliases and name containment when no normalized name matches.
    pub fallback_matching: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            fallback_matching: true,
        }
    }
}

/// Output of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub mapping: FieldMapping,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
enum TableTier {
    Exact,
    Normalized,
    Fallback,
}

struct TableMatch<'i, 'a> {
    tier: TableTier,
    /// Set only for the exact tier.
    entry: Option<&'a TableEntry>,
    logical: &'i LogicalTable<'a>,
}

pub struct Reconciler<'a> {
    catalog: &'a CatalogModel,
    options: ReconcileOptions,
    aliases: TableAliases,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a CatalogModel) -> Self {
        Self {
            catalog,
            options: ReconcileOptions::default(),
            aliases: TableAliases::builtin(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: TableAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn reconcile(&self, specs: &[TargetFieldSpec]) -> Reconciliation {
        let index = CatalogIndex::build(self.catalog);
        let mut diagnostics: Vec<Diagnostic> = index.diagnostics().to_vec();
        for diagnostic in &diagnostics {
            tracing::warn!(
                table = diagnostic.table.as_deref().unwrap_or_default(),
                "{}",
                diagnostic.message
            );
        }

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let entry = self.resolve_spec(&index, spec, &mut diagnostics);
            entries.push(entry);
        }

        let claimed: HashSet<(&str, &str)> = entries
            .iter()
            .filter(|entry| entry.is_mapped())
            .map(|entry| (entry.source_table.as_str(), entry.source_column.as_str()))
            .collect();
        let unclaimed_source_fields: Vec<SourceField> = self
            .catalog
            .tables()
            .iter()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .map(move |column| (table.table_name.as_str(), column.name.as_str()))
            })
            .filter(|field| !claimed.contains(field))
            .map(|(table, column)| SourceField::new(table, column))
            .collect();

        let mut seen = HashSet::new();
        let unmatched_target_fields: Vec<TargetField> = entries
            .iter()
            .filter(|entry| !entry.is_mapped())
            .map(MappingEntry::target_field)
            .filter(|field| seen.insert(field.clone()))
            .collect();

        let mapping = FieldMapping {
            entries,
            unclaimed_source_fields,
            unmatched_target_fields,
        };
        tracing::info!(
            specs = specs.len(),
            exact = mapping.count_with(MatchConfidence::Exact),
            normalized = mapping.count_with(MatchConfidence::Normalized),
            fallback = mapping.count_with(MatchConfidence::Fallback),
            unmapped = mapping.count_with(MatchConfidence::Unmapped),
            unclaimed_source_fields = mapping.unclaimed_source_fields.len(),
            "Reconciled target fields against catalog"
        );

        Reconciliation {
            mapping,
            diagnostics,
        }
    }

    fn resolve_spec(
        &self,
        index: &CatalogIndex<'a>,
        spec: &TargetFieldSpec,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> MappingEntry {
        let Some(table) = self.resolve_table(index, &spec.source_table_hint) else {
            diagnostics.push(unresolved_table(index, spec));
            return MappingEntry::unmapped(&spec.target_table, &spec.target_column);
        };

        let hint = spec.source_column_hint.trim();
        let resolved = if hint.is_empty() {
            None
        } else {
            resolve_column(&table, hint)
        };
        match resolved {
            Some((owner, column, confidence)) => MappingEntry::mapped(
                &spec.target_table,
                &spec.target_column,
                owner,
                column,
                confidence,
            ),
            None => {
                let message = format!(
                    "column '{}' not found in source table '{}' (for {}.{})",
                    hint, spec.source_table_hint, spec.target_table, spec.target_column
                );
                tracing::warn!(
                    source_table = %spec.source_table_hint,
                    source_column = hint,
                    "Source column not found"
                );
                diagnostics.push(
                    Diagnostic::warning(DiagnosticCode::UnresolvedColumn, message)
                        .with_table(spec.source_table_hint.clone())
                        .with_column(hint),
                );
                MappingEntry::unmapped(&spec.target_table, &spec.target_column)
            }
        }
    }

    fn resolve_table<'i>(
        &self,
        index: &'i CatalogIndex<'a>,
        hint: &str,
    ) -> Option<TableMatch<'i, 'a>> {
        if hint.trim().is_empty() {
            return None;
        }
        if let Some(entry) = index.exact_table(hint)
            && let Some(logical) = index.logical_table(hint)
        {
            return Some(TableMatch {
                tier: TableTier::Exact,
                entry: Some(entry),
                logical,
            });
        }
        if let Some(logical) = index.logical_table(hint) {
            return Some(TableMatch {
                tier: TableTier::Normalized,
                entry: None,
                logical,
            });
        }
        if !self.options.fallback_matching {
            return None;
        }
        let logical = self.resolve_fallback(index, hint)?;
        tracing::debug!(hint, table = %logical.key, "Resolved table through fallback");
        Some(TableMatch {
            tier: TableTier::Fallback,
            entry: None,
            logical,
        })
    }

    fn resolve_fallback<'i>(
        &self,
        index: &'i CatalogIndex<'a>,
        hint: &str,
    ) -> Option<&'i LogicalTable<'a>> {
        for candidate in self.aliases.candidates(hint) {
            if let Some(logical) = index.logical_table(candidate) {
                return Some(logical);
            }
        }
        let normalized = normalize_table_name(hint);
        index
            .logical_tables()
            .iter()
            .find(|table| contains_either(&table.key, &normalized))
    }
}

/// Reconcile with default options and the built-in alias table.
pub fn reconcile(catalog: &CatalogModel, specs: &[TargetFieldSpec]) -> Reconciliation {
    Reconciler::new(catalog).reconcile(specs)
}

fn resolve_column<'a>(
    table: &TableMatch<'_, 'a>,
    hint: &str,
) -> Option<(&'a str, &'a str, MatchConfidence)> {
    if let Some(entry) = table.entry
        && let Some((column, exact)) = find_in_entry(entry, hint)
    {
        let confidence = if exact {
            MatchConfidence::Exact
        } else {
            MatchConfidence::Normalized
        };
        return Some((entry.table_name.as_str(), column.name.as_str(), confidence));
    }
    let (found, _) = table.logical.find_column(hint)?;
    let confidence = match table.tier {
        TableTier::Fallback => MatchConfidence::Fallback,
        TableTier::Exact | TableTier::Normalized => MatchConfidence::Normalized,
    };
    Some((found.owner, found.column.name.as_str(), confidence))
}

fn unresolved_table(index: &CatalogIndex<'_>, spec: &TargetFieldSpec) -> Diagnostic {
    let target = format!("{}.{}", spec.target_table, spec.target_column);
    if spec.source_table_hint.trim().is_empty() {
        tracing::debug!(field = %target, "Target field has no source hint");
        return Diagnostic {
            severity: Severity::Info,
            ..Diagnostic::warning(
                DiagnosticCode::UnresolvedTable,
                format!("no source table given for {target}"),
            )
        };
    }
    let mut message = format!(
        "source table '{}' not found in catalog (for {target})",
        spec.source_table_hint
    );
    if let Some(suggestion) = closest_table(index, &spec.source_table_hint) {
        message.push_str(&format!("; closest catalog table is '{suggestion}'"));
    }
    tracing::warn!(source_table = %spec.source_table_hint, field = %target, "Source table not found");
    Diagnostic::warning(DiagnosticCode::UnresolvedTable, message)
        .with_table(spec.source_table_hint.clone())
}

fn closest_table<'a>(index: &CatalogIndex<'a>, hint: &str) -> Option<&'a str> {
    let normalized = normalize_table_name(hint);
    index
        .logical_tables()
        .iter()
        .map(|table| (table, jaro_similarity(normalized.chars(), table.key.chars())))
        .filter(|(_, score)| *score >= SUGGESTION_MIN_SIMILARITY)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .and_then(|(table, _)| table.variants.first().copied())
}
