//! Core data types shared by the IHID to OMOP reconciliation crates.

pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod mapping;
pub mod names;
pub mod table;
pub mod target;
pub mod temporal;

pub use catalog::{CatalogModel, ColumnDescriptor, ColumnInsert, DeclaredType, TableEntry};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, warning_count};
pub use error::{ModelError, Result};
pub use identity::{IdentifierResolution, PersonIdSource};
pub use lookup::CaseInsensitiveSet;
pub use mapping::{FieldMapping, MappingEntry, MatchConfidence, SourceField, TargetField};
pub use names::{normalize_column_key, normalize_table_name, same_table};
pub use table::{CellValue, SourceRow, TargetRecord};
pub use target::{HintKind, TargetFieldSpec, TargetSchema, ValueKind};
