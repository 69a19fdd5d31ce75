//! OMOP target schema, read from the CSV export of the summarized schema sheet.

use std::path::Path;

use omop_model::{HintKind, TargetFieldSpec, TargetSchema};

use crate::error::{IngestError, Result};

pub const TABLE_NAME: &str = "table_name";
pub const FIELD_NAME: &str = "field_name";
pub const DESCRIPTION: &str = "description";
pub const SOURCE_TABLE: &str = "IHID Corresponding Table";
pub const SOURCE_FIELDS_EXACT: &str = "IHID Corresponding Field (Exact)";
pub const SOURCE_FIELDS_NON_EXACT: &str = "IHID Corresponding Fields (Non-Exact)";
pub const NOTES: &str = "Notes";

const REQUIRED_HEADERS: &[&str] = &[TABLE_NAME, FIELD_NAME];

/// A source hint parsed from a field cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHint {
    /// Table named by a `Prefix.column` hint.
    pub table: Option<String>,
    pub column: String,
}

pub fn load_target_schema(path: &Path) -> Result<TargetSchema> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = parse_target_schema(&bytes, path)?;
    tracing::info!(
        path = %path.display(),
        specs = schema.specs().len(),
        tables = schema.tables().len(),
        "Loaded OMOP target schema"
    );
    Ok(schema)
}

/// Parse the schema CSV. `path` is only used in error messages.
pub fn parse_target_schema(bytes: &[u8], path: &Path) -> Result<TargetSchema> {
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

    for required in REQUIRED_HEADERS {
        if header_index(&headers, required).is_none() {
            return Err(IngestError::MissingColumn {
                column: (*required).to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    let index = |name: &str| header_index(&headers, name);
    let (table_idx, field_idx) = (index(TABLE_NAME), index(FIELD_NAME));
    let description_idx = index(DESCRIPTION);
    let source_table_idx = index(SOURCE_TABLE);
    let exact_idx = index(SOURCE_FIELDS_EXACT);
    let non_exact_idx = index(SOURCE_FIELDS_NON_EXACT);

    let mut specs = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::csv(path, &e))?;
        let get = |idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let target_table = get(table_idx);
        let target_column = get(field_idx);
        if target_table.is_empty() || target_column.is_empty() {
            skipped += 1;
            continue;
        }
        let description = Some(get(description_idx)).filter(|d| !d.is_empty());
        let row_table = get(source_table_idx);

        let hints: Vec<(FieldHint, HintKind)> = parse_field_hints(&get(exact_idx))
            .into_iter()
            .map(|hint| (hint, HintKind::Exact))
            .chain(
                parse_field_hints(&get(non_exact_idx))
                    .into_iter()
                    .map(|hint| (hint, HintKind::NonExact)),
            )
            .collect();

        if hints.is_empty() {
            let mut spec = TargetFieldSpec::new(&target_table, &target_column, &row_table, "");
            spec.description = description;
            specs.push(spec);
            continue;
        }
        for (hint, kind) in hints {
            let source_table = hint.table.unwrap_or_else(|| row_table.clone());
            let mut spec =
                TargetFieldSpec::new(&target_table, &target_column, source_table, hint.column)
                    .with_hint_kind(kind);
            spec.description = description.clone();
            specs.push(spec);
        }
    }
    if skipped > 0 {
        tracing::debug!(path = %path.display(), skipped, "Skipped schema rows without table or field name");
    }
    Ok(TargetSchema::new(specs))
}

/// Split a field cell on newlines and commas.
///
/// `Lab.result_val` yields table `Lab` and column `result_val`; a bare
/// `result_val` leaves the table to the row's corresponding table.
pub fn parse_field_hints(cell: &str) -> Vec<FieldHint> {
    cell.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('.') {
            Some((table, column)) if !table.trim().is_empty() && !column.trim().is_empty() => {
                FieldHint {
                    table: Some(table.trim().to_string()),
                    column: column.trim().to_string(),
                }
            }
            _ => FieldHint {
                table: None,
                column: part.to_string(),
            },
        })
        .collect()
}

fn header_index(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_split_on_newlines_and_commas() {
        let hints = parse_field_hints("Admission.mrn, encntr_num\nLab.result_val\n\n");
        assert_eq!(
            hints,
            vec![
                FieldHint {
                    table: Some("Admission".to_string()),
                    column: "mrn".to_string()
                },
                FieldHint {
                    table: None,
                    column: "encntr_num".to_string()
                },
                FieldHint {
                    table: Some("Lab".to_string()),
                    column: "result_val".to_string()
                },
            ]
        );
    }

    #[test]
    fn each_hint_becomes_a_spec() {
        let csv = "table_name,field_name,description,IHID Corresponding Table,IHID Corresponding Field (Exact),IHID Corresponding Fields (Non-Exact),Notes\n\
person,person_id,Person identifier,Admission / Discharge,\"mrn\nDADAbs.mrn\",,\n\
person,gender_concept_id,,Admission / Discharge,,gender_cd,\n\
person,race_concept_id,,,,,\n\
,orphan,,,,,\n";
        let schema = parse_target_schema(csv.as_bytes(), Path::new("schema.csv")).unwrap();
        let specs = schema.specs();
        assert_eq!(specs.len(), 4);

        assert_eq!(specs[0].source_table_hint, "Admission / Discharge");
        assert_eq!(specs[0].description.as_deref(), Some("Person identifier"));
        assert_eq!(specs[1].source_table_hint, "DADAbs");
        assert_eq!(specs[1].source_column_hint, "mrn");
        assert_eq!(specs[2].hint_kind, HintKind::NonExact);
        assert_eq!(specs[3].source_column_hint, "");
        assert_eq!(schema.fields().len(), 3);
    }

    #[test]
    fn missing_required_header_is_fatal() {
        let csv = "table,field\nperson,person_id\n";
        let err = parse_target_schema(csv.as_bytes(), Path::new("schema.csv")).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "table_name"));
    }
}
