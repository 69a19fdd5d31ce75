//! Table name normalization.
//!
//! The functions live in `omop_model::names` so that every crate compares
//! names the same way; they are re-exported here next to the reconciler.

pub use omop_model::names::{normalize_column_key, normalize_table_name, same_table};

/// True when one normalized name contains the other.
///
/// Empty names never match so that a blank hint cannot claim every table.
pub fn contains_either(normalized_a: &str, normalized_b: &str) -> bool {
    if normalized_a.is_empty() || normalized_b.is_empty() {
        return false;
    }
    normalized_a.contains(normalized_b) || normalized_b.contains(normalized_a)
}
