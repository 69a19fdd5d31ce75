//! Lookup index over the source catalog.
//!
//! Built once per reconciliation. Raw table names resolve to their catalog
//! entry; normalized names resolve to a logical table that unions the columns
//! of every spelling variant.

use std::collections::{BTreeSet, HashMap};

use omop_model::{CatalogModel, ColumnDescriptor, Diagnostic, DiagnosticCode, TableEntry};

use crate::normalize::normalize_table_name;

/// A column of a logical table together with the raw table that declared it.
#[derive(Debug, Clone, Copy)]
pub struct UnionColumn<'a> {
    pub column: &'a ColumnDescriptor,
    pub owner: &'a str,
}

/// All spelling variants of one table, merged.
#[derive(Debug, Clone)]
pub struct LogicalTable<'a> {
    /// Normalized name shared by every variant.
    pub key: String,
    /// Raw names in catalog order.
    pub variants: Vec<&'a str>,
    columns: Vec<UnionColumn<'a>>,
}

impl<'a> LogicalTable<'a> {
    /// Union of the variants' columns; the first variant to declare a name wins.
    pub fn columns(&self) -> &[UnionColumn<'a>] {
        &self.columns
    }

    /// Exact name first, then case-insensitive.
    pub fn find_column(&self, name: &str) -> Option<(UnionColumn<'a>, bool)> {
        if let Some(found) = self.columns.iter().find(|c| c.column.name == name) {
            return Some((*found, true));
        }
        self.columns
            .iter()
            .find(|c| c.column.name.eq_ignore_ascii_case(name))
            .map(|found| (*found, false))
    }
}

/// Exact name first, then case-insensitive, within one raw table.
pub fn find_in_entry<'a>(entry: &'a TableEntry, name: &str) -> Option<(&'a ColumnDescriptor, bool)> {
    if let Some(column) = entry.column(name) {
        return Some((column, true));
    }
    entry
        .columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|column| (column, false))
}

#[derive(Debug, Clone)]
pub struct CatalogIndex<'a> {
    catalog: &'a CatalogModel,
    exact: HashMap<&'a str, &'a TableEntry>,
    logical: Vec<LogicalTable<'a>>,
    by_key: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CatalogIndex<'a> {
    pub fn build(catalog: &'a CatalogModel) -> Self {
        let mut exact = HashMap::new();
        let mut logical: Vec<LogicalTable<'a>> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for entry in catalog.tables() {
            exact.entry(entry.table_name.as_str()).or_insert(entry);
            let key = normalize_table_name(&entry.table_name);
            let index = *by_key.entry(key.clone()).or_insert_with(|| {
                logical.push(LogicalTable {
                    key,
                    variants: Vec::new(),
                    columns: Vec::new(),
                });
                logical.len() - 1
            });
            let table = &mut logical[index];
            table.variants.push(entry.table_name.as_str());
            for column in &entry.columns {
                if !table.columns.iter().any(|c| c.column.name == column.name) {
                    table.columns.push(UnionColumn {
                        column,
                        owner: entry.table_name.as_str(),
                    });
                }
            }
        }

        let diagnostics = logical
            .iter()
            .filter_map(|table| ambiguity(catalog, table))
            .collect();

        Self {
            catalog,
            exact,
            logical,
            by_key,
            diagnostics,
        }
    }

    pub fn catalog(&self) -> &'a CatalogModel {
        self.catalog
    }

    /// Catalog entry with exactly this raw name.
    pub fn exact_table(&self, name: &str) -> Option<&'a TableEntry> {
        self.exact.get(name).copied()
    }

    /// Logical table whose normalized name equals the normalized `name`.
    pub fn logical_table(&self, name: &str) -> Option<&LogicalTable<'a>> {
        self.by_key
            .get(&normalize_table_name(name))
            .map(|&index| &self.logical[index])
    }

    /// Logical tables in catalog order of their first variant.
    pub fn logical_tables(&self) -> &[LogicalTable<'a>] {
        &self.logical
    }

    /// Warnings found while merging spelling variants.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Variants that disagree on column names or declared types.
fn ambiguity(catalog: &CatalogModel, table: &LogicalTable<'_>) -> Option<Diagnostic> {
    if table.variants.len() < 2 {
        return None;
    }
    let entries: Vec<&TableEntry> = table
        .variants
        .iter()
        .filter_map(|name| catalog.table(name))
        .collect();

    let name_sets: Vec<BTreeSet<&str>> = entries
        .iter()
        .map(|entry| entry.columns.iter().map(|c| c.name.as_str()).collect())
        .collect();
    let differing_names = name_sets.windows(2).any(|pair| pair[0] != pair[1]);

    let mut conflicting: Vec<&str> = Vec::new();
    for union in &table.columns {
        for entry in &entries {
            if let Some(other) = entry.column(&union.column.name)
                && other.declared_type != union.column.declared_type
                && !conflicting.contains(&union.column.name.as_str())
            {
                conflicting.push(union.column.name.as_str());
            }
        }
    }

    if !differing_names && conflicting.is_empty() {
        return None;
    }

    let mut message = format!(
        "table variants {} name the same table but declare different columns",
        table
            .variants
            .iter()
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    if !conflicting.is_empty() {
        message.push_str(&format!(
            "; conflicting types for {}",
            conflicting.join(", ")
        ));
    }
    message.push_str("; the first declaration of each column is used");
    Some(
        Diagnostic::warning(DiagnosticCode::AmbiguousTable, message).with_table(table.variants[0]),
    )
}

#[cfg(test)]
mod tests {
    use omop_model::DeclaredType;

    use super::*;

    fn column(name: &str, declared_type: DeclaredType) -> ColumnDescriptor {
        ColumnDescriptor::new(name, declared_type, "")
    }

    #[test]
    fn variants_union_first_seen_wins() {
        let mut catalog = CatalogModel::new();
        catalog
            .push_column("Admission / Discharge", column("mrn", DeclaredType::Varchar))
            .unwrap();
        catalog
            .push_column("Admission-Discharge", column("mrn", DeclaredType::Integer))
            .unwrap();
        catalog
            .push_column("Admission-Discharge", column("encntr_num", DeclaredType::Varchar))
            .unwrap();

        let index = CatalogIndex::build(&catalog);
        let table = index.logical_table("admission discharge").unwrap();
        assert_eq!(table.variants, vec!["Admission / Discharge", "Admission-Discharge"]);

        let (mrn, exact) = table.find_column("MRN").unwrap();
        assert!(!exact);
        assert_eq!(mrn.owner, "Admission / Discharge");
        assert_eq!(mrn.column.declared_type, DeclaredType::Varchar);

        let (encounter, _) = table.find_column("encntr_num").unwrap();
        assert_eq!(encounter.owner, "Admission-Discharge");

        assert_eq!(index.diagnostics().len(), 1);
        assert_eq!(index.diagnostics()[0].code, DiagnosticCode::AmbiguousTable);
        assert!(index.diagnostics()[0].message.contains("mrn"));
        assert_eq!(
            index.diagnostics()[0].table.as_deref(),
            Some("Admission / Discharge")
        );
        assert!(!index.diagnostics()[0].message.contains("admission discharge"));
    }

    #[test]
    fn consistent_variants_are_not_ambiguous() {
        let mut catalog = CatalogModel::new();
        for table in ["Census", "census"] {
            catalog
                .push_column(table, column("unit", DeclaredType::Varchar))
                .unwrap();
        }
        let index = CatalogIndex::build(&catalog);
        assert!(index.diagnostics().is_empty());
        assert!(index.exact_table("census").is_some());
        assert!(index.exact_table("CENSUS").is_none());
    }
}
