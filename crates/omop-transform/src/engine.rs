//! Mapping-driven transformation of source rows into OMOP records.

use std::collections::BTreeMap;

use serde::Serialize;

use omop_model::{
    CellValue, Diagnostic, DiagnosticCode, FieldMapping, MappingEntry, PersonIdSource, SourceRow,
    TargetRecord,
};

use crate::convert::convert_value;
use crate::identity::{IdentifierResolver, IdentifierRoles, SyntheticIds};
use crate::row::row_value;

const PERSON_ID: &str = "person_id";
const VISIT_OCCURRENCE_ID: &str = "visit_occurrence_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Convert values to the kind their target column expects.
    pub convert_values: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            convert_values: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub rows_read: usize,
    pub records_by_table: BTreeMap<String, usize>,
    pub person_id_sources: BTreeMap<PersonIdSource, usize>,
    /// Source tables without any mapping entry, in processing order.
    pub unmapped_tables: Vec<String>,
    pub synthetic_ids: u64,
}

impl TransformStats {
    pub fn records_emitted(&self) -> usize {
        self.records_by_table.values().sum()
    }

    pub fn merge(&mut self, other: &TransformStats) {
        self.rows_read += other.rows_read;
        for (table, count) in &other.records_by_table {
            *self.records_by_table.entry(table.clone()).or_default() += count;
        }
        for (source, count) in &other.person_id_sources {
            *self.person_id_sources.entry(*source).or_default() += count;
        }
        self.unmapped_tables
            .extend(other.unmapped_tables.iter().cloned());
        self.synthetic_ids += other.synthetic_ids;
    }
}

/// Records produced from one source table.
#[derive(Debug, Clone, Default)]
pub struct TableTransform {
    pub table_name: String,
    pub records: Vec<TargetRecord>,
    pub stats: TransformStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Records of a whole run grouped by target table.
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub records: BTreeMap<String, Vec<TargetRecord>>,
    pub stats: TransformStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformOutput {
    fn absorb(&mut self, table: TableTransform) {
        self.stats.merge(&table.stats);
        self.diagnostics.extend(table.diagnostics);
        for record in table.records {
            self.records
                .entry(record.target_table.clone())
                .or_default()
                .push(record);
        }
    }
}

/// Entries feeding one target table.
struct PlanTable<'m> {
    target_table: String,
    entries: Vec<&'m MappingEntry>,
}

pub struct TransformEngine<'m> {
    mapping: &'m FieldMapping,
    resolver: IdentifierResolver,
    options: TransformOptions,
}

impl<'m> TransformEngine<'m> {
    pub fn new(mapping: &'m FieldMapping) -> Self {
        Self {
            mapping,
            resolver: IdentifierResolver::new(mapping),
            options: TransformOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: IdentifierRoles) -> Self {
        self.resolver = self.resolver.with_roles(roles);
        self
    }

    /// Transform every table, sharing one synthetic identifier counter.
    pub fn transform_all<'t, I>(&self, tables: I, ids: &mut SyntheticIds) -> TransformOutput
    where
        I: IntoIterator<Item = (&'t str, &'t [SourceRow])>,
    {
        let mut output = TransformOutput::default();
        for (table_name, rows) in tables {
            output.absorb(self.transform(table_name, rows, ids));
        }
        tracing::info!(
            rows = output.stats.rows_read,
            records = output.stats.records_emitted(),
            target_tables = output.records.len(),
            unmapped_tables = output.stats.unmapped_tables.len(),
            synthetic_ids = output.stats.synthetic_ids,
            "Transformed source data"
        );
        output
    }

    /// Transform one source table. Each row yields exactly one record per
    /// target table the mapping feeds from this table.
    pub fn transform(
        &self,
        table_name: &str,
        rows: &[SourceRow],
        ids: &mut SyntheticIds,
    ) -> TableTransform {
        let mut result = TableTransform {
            table_name: table_name.to_string(),
            ..TableTransform::default()
        };
        result.stats.rows_read = rows.len();

        let plan = self.plan(table_name);
        if plan.is_empty() {
            tracing::warn!(table = %table_name, rows = rows.len(), "No mapping entries for source table");
            result.stats.unmapped_tables.push(table_name.to_string());
            result.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::UnmappedDataTable,
                    format!("no mapping entries reference '{table_name}'; {} rows skipped", rows.len()),
                )
                .with_table(table_name),
            );
            return result;
        }

        let issued_before = ids.issued();
        // (source column) → rows missing it
        let mut missing: BTreeMap<&str, usize> = BTreeMap::new();
        // (target table, target column) → values kept as text
        let mut unparseable: BTreeMap<(&str, &str), usize> = BTreeMap::new();

        for row in rows {
            let resolution = self.resolver.resolve(row, ids);
            *result
                .stats
                .person_id_sources
                .entry(resolution.person_id_source)
                .or_default() += 1;

            for table in &plan {
                let mut record = TargetRecord::new(&table.target_table);
                for entry in &table.entries {
                    let column = entry.target_column.as_str();
                    if is_injected(column) || record.contains(column) {
                        continue;
                    }
                    let Some(raw) = row_value(row, &entry.source_column) else {
                        *missing.entry(entry.source_column.as_str()).or_default() += 1;
                        continue;
                    };
                    if let Some(value) = self.value_for(column, raw, &mut unparseable, &table.target_table) {
                        record.insert(column, value);
                    }
                }
                record.insert(PERSON_ID, CellValue::text(&resolution.person_id));
                record.insert(
                    VISIT_OCCURRENCE_ID,
                    CellValue::text(&resolution.visit_occurrence_id),
                );
                *result
                    .stats
                    .records_by_table
                    .entry(table.target_table.clone())
                    .or_default() += 1;
                result.records.push(record);
            }
        }

        result.stats.synthetic_ids = ids.issued() - issued_before;
        report(&mut result, &missing, &unparseable);
        tracing::debug!(
            table = %table_name,
            rows = rows.len(),
            records = result.records.len(),
            target_tables = plan.len(),
            "Transformed source table"
        );
        result
    }

    /// Mapped entries of `table_name`, grouped by target table in entry order.
    fn plan(&self, table_name: &str) -> Vec<PlanTable<'m>> {
        let mut plan: Vec<PlanTable<'m>> = Vec::new();
        for entry in self.mapping.entries_for_source_table(table_name) {
            match plan
                .iter_mut()
                .find(|table| table.target_table.eq_ignore_ascii_case(&entry.target_table))
            {
                Some(table) => table.entries.push(entry),
                None => plan.push(PlanTable {
                    target_table: entry.target_table.clone(),
                    entries: vec![entry],
                }),
            }
        }
        plan
    }

    fn value_for<'p>(
        &self,
        column: &'p str,
        raw: &str,
        unparseable: &mut BTreeMap<(&'p str, &'p str), usize>,
        target_table: &'p str,
    ) -> Option<CellValue> {
        if !self.options.convert_values {
            let trimmed = raw.trim();
            return (!trimmed.is_empty()).then(|| CellValue::text(trimmed));
        }
        let converted = convert_value(column, raw)?;
        if !converted.parsed {
            *unparseable.entry((target_table, column)).or_default() += 1;
        }
        Some(converted.value)
    }
}

fn report(
    result: &mut TableTransform,
    missing: &BTreeMap<&str, usize>,
    unparseable: &BTreeMap<(&str, &str), usize>,
) {
    let table_name = result.table_name.clone();
    for (column, rows) in missing {
        tracing::warn!(table = %table_name, column, rows, "Mapped source column missing from rows");
        result.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::MissingRowField,
                format!("mapped column '{column}' is absent from {rows} rows of '{table_name}'"),
            )
            .with_table(&table_name)
            .with_column(*column),
        );
    }
    for ((target_table, column), rows) in unparseable {
        tracing::debug!(table = %target_table, column, rows, "Values kept as text");
        result.diagnostics.push(
            Diagnostic::info(
                DiagnosticCode::UnparseableValue,
                format!("{rows} values for {target_table}.{column} did not fit the column type and were kept as text"),
            )
            .with_table(*target_table)
            .with_column(*column),
        );
    }
    let synthetic = result
        .stats
        .person_id_sources
        .get(&PersonIdSource::Synthetic)
        .copied()
        .unwrap_or_default();
    if synthetic > 0 {
        tracing::warn!(table = %table_name, rows = synthetic, "Rows fell back to synthetic person identifiers");
        result.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::SyntheticIdentifier,
                format!("{synthetic} rows of '{table_name}' have no patient, MRN or encounter value; synthetic identifiers assigned"),
            )
            .with_table(&table_name),
        );
    }
}

fn is_injected(column: &str) -> bool {
    column.eq_ignore_ascii_case(PERSON_ID) || column.eq_ignore_ascii_case(VISIT_OCCURRENCE_ID)
}

/// Transform one table with a fresh synthetic identifier counter.
pub fn transform(table_name: &str, rows: &[SourceRow], mapping: &FieldMapping) -> TableTransform {
    TransformEngine::new(mapping).transform(table_name, rows, &mut SyntheticIds::new())
}
