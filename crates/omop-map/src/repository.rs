//! Reading and writing mapping documents on disk.

use std::fs;
use std::path::{Path, PathBuf};

use omop_model::FieldMapping;

use crate::aliases::TableAliases;
use crate::document::{DOCUMENT_VERSION, MappingDocument};
use crate::error::{RepositoryError, Result};

/// Write a mapping document as pretty JSON, creating parent directories.
pub fn save_document(path: &Path, document: &MappingDocument) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| RepositoryError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(document).map_err(RepositoryError::Serialize)?;
    fs::write(path, json).map_err(|source| RepositoryError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Wrote mapping document");
    Ok(path.to_path_buf())
}

/// Write a field mapping as a freshly stamped document.
pub fn save_mapping(path: &Path, mapping: &FieldMapping) -> Result<PathBuf> {
    save_document(path, &MappingDocument::from_mapping(mapping))
}

pub fn load_document(path: &Path) -> Result<MappingDocument> {
    let contents = fs::read_to_string(path).map_err(|source| RepositoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: MappingDocument =
        serde_json::from_str(&contents).map_err(|source| RepositoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let major = document.version.split('.').next().unwrap_or_default();
    if major != DOCUMENT_VERSION.split('.').next().unwrap_or_default() {
        return Err(RepositoryError::UnsupportedVersion {
            version: document.version,
            path: path.to_path_buf(),
        });
    }
    Ok(document)
}

pub fn load_mapping(path: &Path) -> Result<FieldMapping> {
    Ok(load_document(path)?.to_mapping())
}

/// Load a JSON alias file and overlay it on the built-in aliases.
pub fn load_aliases(path: &Path) -> Result<TableAliases> {
    let contents = fs::read_to_string(path).map_err(|source| RepositoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let custom = TableAliases::from_json_str(&contents)?;
    tracing::debug!(path = %path.display(), aliases = custom.len(), "Loaded table aliases");
    Ok(TableAliases::builtin().merged(custom))
}
