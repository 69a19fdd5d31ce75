//! Coverage of a field mapping over the catalog and the target schema.
//!
//! Only entries whose tables and fields exist on the respective side count,
//! so every ratio stays within `[0, 1]`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use omop_model::{
    CatalogModel, Diagnostic, DiagnosticCode, FieldMapping, MatchConfidence, SourceField,
    TargetField, TargetSchema, ValueKind,
};

use crate::report::{CoverageReport, CoverageStat, TableGap};

pub fn validate(
    mapping: &FieldMapping,
    catalog: &CatalogModel,
    schema: &TargetSchema,
) -> CoverageReport {
    let claimed_sources: HashSet<SourceField> =
        mapping.mapped().filter_map(|entry| entry.source_field()).collect();
    let claimed_source_tables: HashSet<&str> = claimed_sources
        .iter()
        .map(|field| field.table.as_str())
        .collect();
    let mapped_targets: HashSet<TargetField> =
        mapping.mapped().map(|entry| entry.target_field()).collect();

    // Source side.
    let mut source_tables_mapped = 0usize;
    let mut unmapped_source_tables = BTreeSet::new();
    let mut source_fields_total = 0usize;
    let mut source_fields_mapped = 0usize;
    let mut unmapped_source_fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut seen_tables = HashSet::new();
    for table in catalog.tables() {
        if !seen_tables.insert(table.table_name.as_str()) {
            continue;
        }
        if claimed_source_tables.contains(table.table_name.as_str()) {
            source_tables_mapped += 1;
        } else {
            unmapped_source_tables.insert(table.table_name.clone());
        }
        for column in &table.columns {
            source_fields_total += 1;
            let field = SourceField::new(&table.table_name, &column.name);
            if claimed_sources.contains(&field) {
                source_fields_mapped += 1;
            } else {
                unmapped_source_fields
                    .entry(field.table)
                    .or_default()
                    .push(field.column);
            }
        }
    }
    for columns in unmapped_source_fields.values_mut() {
        columns.sort();
    }

    // Target side.
    let target_tables = schema.tables();
    let target_fields = schema.fields();
    let mut unmapped_target_fields: BTreeMap<String, Vec<String>> = target_tables
        .iter()
        .map(|table| ((*table).to_string(), Vec::new()))
        .collect();
    let mut mapped_by_table: BTreeMap<&str, usize> = BTreeMap::new();
    let mut target_fields_mapped = 0usize;
    for field in &target_fields {
        if mapped_targets.contains(field) {
            target_fields_mapped += 1;
            *mapped_by_table.entry(field.table.as_str()).or_default() += 1;
        } else if let Some(columns) = unmapped_target_fields.get_mut(&field.table) {
            columns.push(field.column.clone());
        }
    }
    for columns in unmapped_target_fields.values_mut() {
        columns.sort();
    }
    let unmapped_target_tables: Vec<String> = target_tables
        .iter()
        .filter(|table| !mapped_by_table.contains_key(**table))
        .map(|table| (*table).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let gaps = rank_gaps(&unmapped_target_fields);
    unmapped_target_fields.retain(|_, columns| !columns.is_empty());

    let confidence = MatchConfidence::all()
        .into_iter()
        .map(|level| (level, mapping.count_with(level)))
        .collect();

    let report = CoverageReport {
        source_tables: CoverageStat::new(seen_tables.len(), source_tables_mapped),
        source_fields: CoverageStat::new(source_fields_total, source_fields_mapped),
        target_tables: CoverageStat::new(target_tables.len(), mapped_by_table.len()),
        target_fields: CoverageStat::new(target_fields.len(), target_fields_mapped),
        unmapped_source_tables: unmapped_source_tables.into_iter().collect(),
        unmapped_source_fields,
        unmapped_target_tables,
        unmapped_target_fields,
        gaps,
        confidence,
        diagnostics: type_mismatches(mapping, catalog),
    };
    tracing::info!(
        source_fields = %format_ratio(&report.source_fields),
        target_fields = %format_ratio(&report.target_fields),
        warnings = report.warning_count(),
        "Validated mapping coverage"
    );
    report
}

/// Every target table by unmapped field count descending, then name.
fn rank_gaps(unmapped: &BTreeMap<String, Vec<String>>) -> Vec<TableGap> {
    let mut gaps: Vec<TableGap> = unmapped
        .iter()
        .map(|(table, fields)| TableGap {
            table: table.clone(),
            unmapped_count: fields.len(),
            unmapped_fields: fields.clone(),
        })
        .collect();
    gaps.sort_by(|a, b| {
        b.unmapped_count
            .cmp(&a.unmapped_count)
            .then_with(|| a.table.cmp(&b.table))
    });
    gaps
}

/// Mapped entries whose declared source type cannot hold the target column's kind.
fn type_mismatches(mapping: &FieldMapping, catalog: &CatalogModel) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for entry in mapping.mapped() {
        let Some(column) = catalog
            .table(&entry.source_table)
            .and_then(|table| table.column(&entry.source_column))
        else {
            continue;
        };
        let expected = ValueKind::for_column(&entry.target_column);
        if expected.accepts(&column.declared_type) {
            continue;
        }
        tracing::warn!(
            field = %entry.target_field(),
            source = %format!("{}.{}", entry.source_table, entry.source_column),
            declared = %column.declared_type,
            "Declared source type does not fit target column"
        );
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::TypeMismatch,
                format!(
                    "{}.{} is declared {} but {} expects {:?} values",
                    entry.source_table,
                    entry.source_column,
                    column.declared_type,
                    entry.target_field(),
                    expected
                ),
            )
            .with_table(&entry.target_table)
            .with_column(&entry.target_column),
        );
    }
    diagnostics
}

fn format_ratio(stat: &CoverageStat) -> String {
    format!("{}/{} ({:.1}%)", stat.mapped, stat.total, stat.ratio() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use omop_model::{ColumnDescriptor, DeclaredType, MappingEntry, TargetFieldSpec};

    #[test]
    fn entries_outside_both_schemas_are_ignored() {
        let mut catalog = CatalogModel::new();
        catalog
            .push_column("Census", ColumnDescriptor::new("mrn", DeclaredType::Varchar, ""))
            .unwrap();
        let schema = TargetSchema::new(vec![TargetFieldSpec::new("person", "person_id", "Census", "mrn")]);
        let mapping = FieldMapping {
            entries: vec![
                MappingEntry::mapped("person", "person_id", "Census", "mrn", MatchConfidence::Exact),
                MappingEntry::mapped("note", "note_text", "Ghost", "text", MatchConfidence::Fallback),
            ],
            ..FieldMapping::default()
        };
        let report = validate(&mapping, &catalog, &schema);
        assert_eq!(report.source_fields, CoverageStat::new(1, 1));
        assert_eq!(report.target_tables, CoverageStat::new(1, 1));
        assert_eq!(report.target_fields.ratio(), 1.0);
        assert_eq!(report.confidence[&MatchConfidence::Fallback], 1);
        assert_eq!(report.confidence[&MatchConfidence::Unmapped], 0);
    }

    #[test]
    fn incompatible_declared_types_are_flagged() {
        let mut catalog = CatalogModel::new();
        catalog
            .push_column("Lab", ColumnDescriptor::new("result_dt_tm", DeclaredType::Datetime, ""))
            .unwrap();
        let mapping = FieldMapping {
            entries: vec![MappingEntry::mapped(
                "measurement",
                "value_as_number",
                "Lab",
                "result_dt_tm",
                MatchConfidence::Normalized,
            )],
            ..FieldMapping::default()
        };
        let report = validate(&mapping, &catalog, &TargetSchema::default());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, DiagnosticCode::TypeMismatch);
        assert_eq!(report.diagnostics[0].column.as_deref(), Some("value_as_number"));
    }
}
