//! Loaders for the IHID catalog, the OMOP target schema and IHID source extracts.

pub mod catalog;
pub mod discovery;
pub mod error;
pub mod generate;
pub mod source_data;
pub mod target_schema;

pub use catalog::{CatalogLoad, CatalogRow, catalog_from_rows, catalog_rows, load_catalog, write_catalog};
pub use discovery::{
    SourceFile, discover_source_files, list_csv_files, table_name_from_path, table_name_from_stem,
};
pub use error::{IngestError, Result};
pub use generate::{
    DEFAULT_SAMPLE_ROWS, GeneratedCatalog, generate_catalog, generate_explanation,
    infer_declared_type,
};
pub use source_data::{
    SourceTable, parse_source_csv, read_source_dir, read_source_table, read_source_table_as,
};
pub use target_schema::{FieldHint, load_target_schema, parse_field_hints, parse_target_schema};
