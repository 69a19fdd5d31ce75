//! IHID catalog JSON (`All_Tables_Combined.json`).
//!
//! The document is a flat array with one object per column. Columns are grouped
//! under their `Source_Section` in first-appearance order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use omop_model::{
    CatalogModel, ColumnDescriptor, ColumnInsert, DeclaredType, Diagnostic, DiagnosticCode,
};

use crate::error::{IngestError, Result};

/// One row of the catalog document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "Source_Section", default)]
    pub source_section: Option<String>,
    #[serde(rename = "Column Name", default)]
    pub column_name: Option<String>,
    #[serde(rename = "Data Type", default)]
    pub data_type: Option<String>,
    #[serde(rename = "Explanation", default)]
    pub explanation: Option<String>,
}

/// A loaded catalog and the problems found while grouping it.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub catalog: CatalogModel,
    pub diagnostics: Vec<Diagnostic>,
    /// Rows without a table or column name.
    pub skipped_rows: usize,
}

pub fn load_catalog(path: &Path) -> Result<CatalogLoad> {
    let contents = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<CatalogRow> =
        serde_json::from_str(&contents).map_err(|source| IngestError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    let load = catalog_from_rows(rows);
    tracing::info!(
        path = %path.display(),
        tables = load.catalog.table_count(),
        columns = load.catalog.column_count(),
        skipped = load.skipped_rows,
        "Loaded IHID catalog"
    );
    Ok(load)
}

/// Group catalog rows into tables. Later duplicates of a column are dropped.
///
/// Table names are stored exactly as written; they are only trimmed to
/// decide whether a row names a table at all.
pub fn catalog_from_rows(rows: Vec<CatalogRow>) -> CatalogLoad {
    let mut load = CatalogLoad::default();
    for row in rows {
        let table = row.source_section.as_deref().unwrap_or_default();
        let column = row.column_name.as_deref().map(str::trim).unwrap_or_default();
        if table.trim().is_empty() || column.is_empty() {
            load.skipped_rows += 1;
            continue;
        }
        let descriptor = ColumnDescriptor::new(
            column,
            row.data_type
                .as_deref()
                .map(DeclaredType::parse)
                .unwrap_or_default(),
            row.explanation.unwrap_or_default(),
        );
        match load.catalog.push_column(table, descriptor) {
            Ok(ColumnInsert::Added) => {}
            Ok(ColumnInsert::Duplicate) => {
                tracing::warn!(table, column, "Duplicate catalog column ignored");
                load.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::DuplicateColumn,
                        format!("column '{column}' declared more than once in '{table}'; the first declaration is kept"),
                    )
                    .with_table(table)
                    .with_column(column),
                );
            }
            // Blank names were filtered above.
            Err(_) => load.skipped_rows += 1,
        }
    }
    load
}

/// Flatten a catalog back into document rows.
pub fn catalog_rows(catalog: &CatalogModel) -> Vec<CatalogRow> {
    catalog
        .tables()
        .iter()
        .flat_map(|table| {
            table.columns.iter().map(move |column| CatalogRow {
                source_section: Some(table.table_name.clone()),
                column_name: Some(column.name.clone()),
                data_type: Some(column.declared_type.to_string()),
                explanation: Some(column.explanation.clone()),
            })
        })
        .collect()
}

pub fn write_catalog(path: &Path, catalog: &CatalogModel) -> Result<()> {
    let json = serde_json::to_string_pretty(&catalog_rows(catalog)).map_err(|source| {
        IngestError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_rows_and_skips_incomplete_ones() {
        let json = r#"[
            {"Source_Section": "Admission / Discharge", "Column Name": "mrn", "Data Type": "VARCHAR", "Explanation": "MRN"},
            {"Source_Section": "Admission / Discharge", "Column Name": "encntr_num", "Data Type": null},
            {"Source_Section": null, "Column Name": "orphan"},
            {"Source_Section": "Census", "Column Name": "unit_cd", "Data Type": "varchar(20)"},
            {"Source_Section": "Admission / Discharge", "Column Name": "mrn", "Data Type": "INTEGER"}
        ]"#;
        let rows: Vec<CatalogRow> = serde_json::from_str(json).unwrap();
        let load = catalog_from_rows(rows);

        assert_eq!(load.skipped_rows, 1);
        assert_eq!(load.catalog.table_count(), 2);
        let admission = load.catalog.table("Admission / Discharge").unwrap();
        assert_eq!(admission.columns.len(), 2);
        assert_eq!(admission.columns[0].declared_type, DeclaredType::Varchar);
        assert_eq!(load.diagnostics.len(), 1);
        assert_eq!(load.diagnostics[0].code, DiagnosticCode::DuplicateColumn);
    }

    #[test]
    fn table_names_are_kept_as_written() {
        let json = r#"[
            {"Source_Section": "Census ", "Column Name": " bed "},
            {"Source_Section": "   ", "Column Name": "unit_cd"}
        ]"#;
        let rows: Vec<CatalogRow> = serde_json::from_str(json).unwrap();
        let load = catalog_from_rows(rows);

        assert_eq!(load.skipped_rows, 1);
        assert!(load.catalog.table("Census").is_none());
        let census = load.catalog.table("Census ").unwrap();
        assert_eq!(census.columns[0].name, "bed");
    }
}
