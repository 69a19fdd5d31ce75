//! Data file discovery and table-name derivation.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// File-stem spellings that differ from the catalog's table names.
const TABLE_NAME_FIXES: &[(&str, &str)] = &[
    ("Admission Discharge", "Admission / Discharge"),
    ("Dad Information", "DAD Information"),
    ("Dad Diagnosis", "DAD Diagnosis"),
    ("Dad Intervention", "DAD Intervention"),
    ("Dad Interevention", "DAD Intervention"),
    ("Lab Result", "Laboratory Result"),
    ("Lab Results", "Laboratory Result"),
];

/// A source data file and the catalog table it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub table_name: String,
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Lists data files with their derived table names.
pub fn discover_source_files(dir: &Path) -> Result<Vec<SourceFile>> {
    let files = list_csv_files(dir)?;
    tracing::debug!(dir = %dir.display(), files = files.len(), "Discovered CSV files");
    Ok(files
        .into_iter()
        .map(|path| {
            let table_name = table_name_from_path(&path);
            SourceFile { path, table_name }
        })
        .collect())
}

pub fn table_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    table_name_from_stem(stem)
}

/// Derive a catalog table name from a file stem.
///
/// `"1. admission_discharge"` becomes `"Admission / Discharge"`: a leading
/// ordinal is dropped, underscores become spaces, words are title-cased and
/// known spellings are corrected.
pub fn table_name_from_stem(stem: &str) -> String {
    let without_ordinal = strip_ordinal(stem.trim());
    let words: Vec<String> = without_ordinal
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect();
    let name = words.join(" ");
    TABLE_NAME_FIXES
        .iter()
        .find(|(from, _)| *from == name)
        .map_or(name, |(_, to)| (*to).to_string())
}

fn strip_ordinal(stem: &str) -> &str {
    let digits = stem.len() - stem.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return stem;
    }
    let rest = &stem[digits..];
    match rest.chars().next() {
        Some('.' | '_' | '-' | ' ') => rest[1..].trim_start_matches([' ', '_']),
        _ => stem,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
