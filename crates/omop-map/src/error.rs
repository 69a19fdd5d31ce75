//! Error types for mapping persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or writing mapping documents and alias files.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mapping document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize mapping document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("unsupported mapping document version '{version}' in {path}")]
    UnsupportedVersion { version: String, path: PathBuf },

    #[error("invalid table alias file: {0}")]
    InvalidAliases(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
