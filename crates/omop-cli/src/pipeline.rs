//! Pipeline stages shared by the `omop` subcommands.
//!
//! 1. **Ingest**: load the catalog and the target schema
//! 2. **Map**: reconcile the target schema against the catalog
//! 3. **Transform**: turn source extracts into OMOP records
//! 4. **Output**: write one JSON file per target table
//!
//! Each stage returns typed results; structural problems abort through `anyhow`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use omop_ingest::{CatalogLoad, load_catalog, load_target_schema, read_source_dir};
use omop_map::{ReconcileOptions, Reconciler, Reconciliation, TableAliases, load_aliases};
use omop_model::{FieldMapping, TargetRecord, TargetSchema};
use omop_transform::{
    IdentifierRoles, SyntheticIds, TransformEngine, TransformOptions, TransformOutput,
};

use crate::logging::redact_value;

// ============================================================================
// Stage 1: Ingest
// ============================================================================

#[derive(Debug)]
pub struct Inputs {
    pub catalog: CatalogLoad,
    pub schema: TargetSchema,
}

pub fn ingest(catalog_path: &Path, schema_path: &Path) -> Result<Inputs> {
    let catalog = load_catalog(catalog_path)
        .with_context(|| format!("load catalog {}", catalog_path.display()))?;
    let schema = load_target_schema(schema_path)
        .with_context(|| format!("load target schema {}", schema_path.display()))?;
    Ok(Inputs { catalog, schema })
}

// ============================================================================
// Stage 2: Map
// ============================================================================

/// Reconcile the schema, with built-in aliases extended from `aliases_path`.
pub fn map(
    inputs: &Inputs,
    aliases_path: Option<&Path>,
    options: ReconcileOptions,
) -> Result<Reconciliation> {
    let aliases = match aliases_path {
        Some(path) => {
            load_aliases(path).with_context(|| format!("load table aliases {}", path.display()))?
        }
        None => TableAliases::builtin(),
    };
    let start = Instant::now();
    let reconciliation = Reconciler::new(&inputs.catalog.catalog)
        .with_aliases(aliases)
        .with_options(options)
        .reconcile(inputs.schema.specs());
    info!(
        entries = reconciliation.mapping.len(),
        mapped = reconciliation.mapping.mapped().count(),
        duration_ms = start.elapsed().as_millis(),
        "map complete"
    );
    Ok(reconciliation)
}

// ============================================================================
// Stage 3: Transform
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub options: TransformOptions,
    /// First synthetic counter value, for partitioned runs.
    pub synthetic_offset: u64,
    /// Extra columns per identifier role, searched after the mapped ones.
    pub patient_columns: Vec<String>,
    pub alternate_columns: Vec<String>,
    pub encounter_columns: Vec<String>,
}

impl TransformConfig {
    fn roles(&self, mapping: &FieldMapping) -> IdentifierRoles {
        let mut roles = IdentifierRoles::from_mapping(mapping);
        roles.patient.extend(self.patient_columns.iter().cloned());
        roles.alternate.extend(self.alternate_columns.iter().cloned());
        roles.encounter.extend(self.encounter_columns.iter().cloned());
        roles
    }
}

pub fn transform(
    data_dir: &Path,
    mapping: &FieldMapping,
    config: &TransformConfig,
) -> Result<TransformOutput> {
    let start = Instant::now();
    let tables = read_source_dir(data_dir)
        .with_context(|| format!("read source data {}", data_dir.display()))?;
    let engine = TransformEngine::new(mapping)
        .with_options(config.options)
        .with_roles(config.roles(mapping));
    let mut ids = SyntheticIds::with_offset(config.synthetic_offset);
    let mut output = engine.transform_all(
        tables
            .iter()
            .map(|table| (table.table_name.as_str(), table.rows.as_slice())),
        &mut ids,
    );
    for table in tables {
        output.diagnostics.extend(table.diagnostics.into_iter().map(|diagnostic| {
            diagnostic.with_table(table.table_name.clone())
        }));
    }
    for (target_table, records) in &output.records {
        if let Some(person_id) = records.first().and_then(|record| record.get_str("person_id")) {
            trace!(
                table = %target_table,
                person_id = %redact_value(&person_id),
                "First record"
            );
        }
    }
    info!(
        records = output.stats.records_emitted(),
        duration_ms = start.elapsed().as_millis(),
        "transform complete"
    );
    Ok(output)
}

// ============================================================================
// Stage 4: Output
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutput {
    pub table: String,
    pub path: PathBuf,
    pub records: usize,
}

/// Write `<output_dir>/<target_table>.json` for every target table.
pub fn write_target_tables(
    output_dir: &Path,
    records: &BTreeMap<String, Vec<TargetRecord>>,
) -> Result<Vec<TableOutput>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;
    let mut outputs = Vec::with_capacity(records.len());
    for (table, rows) in records {
        let path = output_dir.join(format!("{table}.json"));
        let json = serde_json::to_string_pretty(rows)
            .with_context(|| format!("serialize {table} records"))?;
        std::fs::write(&path, format!("{json}\n"))
            .with_context(|| format!("write {}", path.display()))?;
        debug!(table = %table, records = rows.len(), path = %path.display(), "Wrote target table");
        outputs.push(TableOutput {
            table: table.clone(),
            path,
            records: rows.len(),
        });
    }
    Ok(outputs)
}
