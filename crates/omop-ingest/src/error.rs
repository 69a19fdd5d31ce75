//! Error types for IHID and OMOP input loading.

use std::path::PathBuf;

use thiserror::Error;

/// Structural input errors. Content problems inside otherwise readable files
/// are reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("failed to parse JSON {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize JSON for {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Required column not found in a header row.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

impl IngestError {
    pub(crate) fn csv(path: &std::path::Path, error: &csv::Error) -> Self {
        IngestError::CsvParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
