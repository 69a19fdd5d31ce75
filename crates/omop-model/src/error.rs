use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("table name must not be empty")]
    EmptyTableName,
    #[error("column name must not be empty (table {table})")]
    EmptyColumnName { table: String },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
