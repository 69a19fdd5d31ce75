//! Schema reconciliation between the IHID catalog and OMOP target fields.

pub mod aliases;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalize;
pub mod repository;

pub use aliases::TableAliases;
pub use document::{DOCUMENT_VERSION, MappingDocument, SourceBinding};
pub use engine::{ReconcileOptions, Reconciler, Reconciliation, reconcile};
pub use error::RepositoryError;
pub use index::CatalogIndex;
pub use normalize::{normalize_column_key, normalize_table_name, same_table};
pub use repository::{load_aliases, load_document, load_mapping, save_document, save_mapping};
