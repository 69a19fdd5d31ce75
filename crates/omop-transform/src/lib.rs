//! Record-level transformation of IHID rows into OMOP tables.
//!
//! - **identity**: root identifier fallback chain and synthetic identifiers
//! - **convert**: value conversion driven by target column names
//! - **engine**: per-table transformation driven by a field mapping

pub mod convert;
pub mod engine;
pub mod identity;
mod row;

pub use convert::{Converted, convert_value};
pub use engine::{
    TableTransform, TransformEngine, TransformOptions, TransformOutput, TransformStats, transform,
};
pub use identity::{IdentifierResolver, IdentifierRoles, SyntheticIds, resolve};
