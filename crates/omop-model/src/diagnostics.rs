//! Non-fatal findings reported alongside results.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Several raw spellings of one table disagree on a column's type.
    AmbiguousTable,
    /// A catalog table declares the same column twice.
    DuplicateColumn,
    /// A source table hint matched no catalog table.
    UnresolvedTable,
    /// The table resolved but the column hint did not.
    UnresolvedColumn,
    /// A mapped source column was absent from a data row.
    MissingRowField,
    /// A data table has no mapping entries.
    UnmappedDataTable,
    /// Declared source type is incompatible with the target column.
    TypeMismatch,
    /// A row fell back to a synthetic identifier.
    SyntheticIdentifier,
    /// A data file repeats a header after standardization.
    DuplicateRowColumn,
    /// A value could not be converted to the target column's type.
    UnparseableValue,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::AmbiguousTable => "ambiguous_table",
            DiagnosticCode::DuplicateColumn => "duplicate_column",
            DiagnosticCode::UnresolvedTable => "unresolved_table",
            DiagnosticCode::UnresolvedColumn => "unresolved_column",
            DiagnosticCode::MissingRowField => "missing_row_field",
            DiagnosticCode::UnmappedDataTable => "unmapped_data_table",
            DiagnosticCode::TypeMismatch => "type_mismatch",
            DiagnosticCode::SyntheticIdentifier => "synthetic_identifier",
            DiagnosticCode::DuplicateRowColumn => "duplicate_row_column",
            DiagnosticCode::UnparseableValue => "unparseable_value",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            table: None,
            column: None,
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(code, message)
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Count diagnostics with warning severity.
pub fn warning_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_warning()).count()
}
