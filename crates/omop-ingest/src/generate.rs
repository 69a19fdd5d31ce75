//! Regenerate the catalog from the source extracts themselves.
//!
//! Declared types are inferred from the first rows of each file and
//! explanations are derived from column-name conventions.

use std::path::Path;

use omop_model::{
    CatalogModel, ColumnDescriptor, ColumnInsert, DeclaredType, Diagnostic, DiagnosticCode, temporal,
};

use crate::discovery::discover_source_files;
use crate::error::{IngestError, Result};

/// Rows sampled per file for type inference.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct GeneratedCatalog {
    pub catalog: CatalogModel,
    pub diagnostics: Vec<Diagnostic>,
    pub files: usize,
}

pub fn generate_catalog(dir: &Path, sample_rows: usize) -> Result<GeneratedCatalog> {
    let mut generated = GeneratedCatalog::default();
    for file in discover_source_files(dir)? {
        let bytes = std::fs::read(&file.path).map_err(|source| IngestError::FileRead {
            path: file.path.clone(),
            source,
        })?;
        let (headers, samples) = sample_columns(&bytes, &file.path, sample_rows)?;
        for (header, values) in headers.iter().zip(&samples) {
            let declared_type = infer_declared_type(values);
            let explanation = generate_explanation(header, &file.table_name, values);
            let descriptor = ColumnDescriptor::new(header.as_str(), declared_type, explanation);
            match generated.catalog.push_column(&file.table_name, descriptor) {
                Ok(ColumnInsert::Added) => {}
                Ok(ColumnInsert::Duplicate) => generated.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::DuplicateColumn,
                        format!("column '{header}' appears more than once for '{}'", file.table_name),
                    )
                    .with_table(file.table_name.clone())
                    .with_column(header.clone()),
                ),
                Err(error) => {
                    tracing::warn!(path = %file.path.display(), %error, "Skipped column");
                }
            }
        }
        tracing::debug!(
            path = %file.path.display(),
            table = %file.table_name,
            columns = headers.len(),
            "Profiled source file"
        );
        generated.files += 1;
    }
    tracing::info!(
        dir = %dir.display(),
        files = generated.files,
        tables = generated.catalog.table_count(),
        columns = generated.catalog.column_count(),
        "Generated catalog from source data"
    );
    Ok(generated)
}

/// Trimmed headers and, per header, the non-empty values of the first rows.
fn sample_columns(bytes: &[u8], path: &Path, limit: usize) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::csv(path, &e))?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').trim().to_string())
        .collect();
    let mut samples = vec![Vec::new(); headers.len()];
    for record in reader.records().take(limit) {
        let record = record.map_err(|e| IngestError::csv(path, &e))?;
        for (slot, value) in samples.iter_mut().zip(record.iter()) {
            let value = value.trim();
            if !value.is_empty() {
                slot.push(value.to_string());
            }
        }
    }
    Ok((headers, samples))
}

/// Narrowest type that holds every sampled value; VARCHAR when nothing was sampled.
pub fn infer_declared_type(values: &[String]) -> DeclaredType {
    if values.is_empty() {
        return DeclaredType::Varchar;
    }
    let all = |check: fn(&str) -> bool| values.iter().all(|v| check(v.as_str()));
    if all(|v| v.parse::<i64>().is_ok()) {
        DeclaredType::Integer
    } else if all(|v| v.parse::<f64>().is_ok_and(f64::is_finite)) {
        DeclaredType::Decimal
    } else if all(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "false")) {
        DeclaredType::Boolean
    } else if all(|v| temporal::parse_datetime(v).is_some()) {
        DeclaredType::Datetime
    } else {
        DeclaredType::Varchar
    }
}

/// Describe a column from its name, most specific pattern first.
pub fn generate_explanation(column: &str, table: &str, samples: &[String]) -> String {
    let lower = column.to_lowercase();
    let has = |needle: &str| lower.contains(needle);
    let readable = |suffix: &str| {
        column[..column.len() - suffix.len()].replace('_', " ")
    };

    let known = if has("mrn") {
        Some("Medical Record Number - unique patient identifier")
    } else if has("encntr_num") {
        Some("Encounter number - unique identifier for a hospital visit/encounter")
    } else if has("admit") && has("dt_tm") {
        Some("Date and time of patient admission")
    } else if has("disch") && has("dt_tm") {
        Some("Date and time of patient discharge")
    } else if has("age") {
        Some("Patient age at the time of the event")
    } else if has("gender") {
        Some("Patient gender information")
    } else if has("diagnosis") && has("cd") {
        Some("Diagnosis code (typically ICD-10)")
    } else if has("diagnosis") && has("desc") {
        Some("Diagnosis description")
    } else if has("los") {
        Some("Length of stay in days")
    } else if has("nursing_unit") {
        Some("Nursing unit or ward location")
    } else if has("facility") {
        Some("Healthcare facility identifier or name")
    } else if has("event_id") {
        Some("Unique identifier for a clinical event")
    } else if has("result_value") {
        Some("Numeric or text result value for a clinical measurement")
    } else if has("result_interpretation") {
        Some("Clinical interpretation of a result")
    } else {
        None
    };
    if let Some(text) = known {
        return text.to_string();
    }

    if lower.ends_with("_cd") {
        format!("Code value for {}", readable("_cd"))
    } else if lower.ends_with("_desc") {
        format!("Description for {}", readable("_desc"))
    } else if lower.ends_with("_dt_tm") {
        format!("Date and time for {}", readable("_dt_tm"))
    } else if samples.is_empty() {
        format!("Data field from {table} table.")
    } else {
        let shown: Vec<&str> = samples.iter().take(2).map(String::as_str).collect();
        format!("Data field from {table} table. Sample values: {}", shown.join(", "))
    }
}
