//! IHID source extracts: one CSV file per catalog table.

use std::path::{Path, PathBuf};

use omop_model::{Diagnostic, DiagnosticCode, SourceRow, normalize_column_key};

use crate::discovery::{SourceFile, discover_source_files, table_name_from_path};
use crate::error::{IngestError, Result};

/// Rows of one data file, keyed by standardized header.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub table_name: String,
    pub path: PathBuf,
    /// Standardized headers in file order, without duplicates.
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Read every CSV file in a directory.
pub fn read_source_dir(dir: &Path) -> Result<Vec<SourceTable>> {
    let files = discover_source_files(dir)?;
    let mut tables = Vec::with_capacity(files.len());
    for SourceFile { path, table_name } in files {
        tables.push(read_source_table_as(&path, table_name)?);
    }
    let rows: usize = tables.iter().map(SourceTable::row_count).sum();
    tracing::info!(dir = %dir.display(), tables = tables.len(), rows, "Loaded source data");
    Ok(tables)
}

/// Read one data file, deriving the table name from the file name.
pub fn read_source_table(path: &Path) -> Result<SourceTable> {
    read_source_table_as(path, table_name_from_path(path))
}

pub fn read_source_table_as(path: &Path, table_name: String) -> Result<SourceTable> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut table = parse_source_csv(&bytes, path)?;
    table.table_name = table_name;
    tracing::debug!(
        path = %path.display(),
        table = %table.table_name,
        rows = table.rows.len(),
        columns = table.headers.len(),
        "Read source table"
    );
    Ok(table)
}

/// Parse CSV bytes. Short rows leave their trailing columns absent; cells
/// beyond the header are ignored.
pub fn parse_source_csv(bytes: &[u8], path: &Path) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let raw_headers = reader
        .headers()
        .map_err(|e| IngestError::csv(path, &e))?
        .clone();

    let mut diagnostics = Vec::new();
    let mut headers: Vec<String> = Vec::new();
    // Column index → key; `None` for dropped duplicates and blank headers.
    let mut keys: Vec<Option<usize>> = Vec::with_capacity(raw_headers.len());
    for raw in raw_headers.iter() {
        let key = normalize_column_key(raw.trim_matches('\u{feff}'));
        if key.is_empty() {
            keys.push(None);
            continue;
        }
        if headers.contains(&key) {
            tracing::warn!(path = %path.display(), column = %key, "Duplicate column after header standardization");
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::DuplicateRowColumn,
                    format!("header '{raw}' repeats column '{key}'; the first occurrence is used"),
                )
                .with_column(key),
            );
            keys.push(None);
            continue;
        }
        keys.push(Some(headers.len()));
        headers.push(key);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::csv(path, &e))?;
        let mut row = SourceRow::new();
        for (value, key) in record.iter().zip(&keys) {
            if let Some(index) = key {
                row.insert(headers[*index].clone(), value.to_string());
            }
        }
        rows.push(row);
    }

    Ok(SourceTable {
        table_name: String::new(),
        path: path.to_path_buf(),
        headers,
        rows,
        diagnostics,
    })
}
