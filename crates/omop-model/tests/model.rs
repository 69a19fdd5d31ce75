//! Tests for omop-model types.

use omop_model::{
    CatalogModel, CellValue, ColumnDescriptor, DeclaredType, Diagnostic, DiagnosticCode,
    FieldMapping, MappingEntry, MatchConfidence, ModelError, TableEntry, TargetRecord,
    warning_count,
};

#[test]
fn catalog_deserializes_with_missing_optional_fields() {
    let json = r#"{
        "tables": [
            {
                "table_name": "Admission / Discharge",
                "columns": [
                    {"name": "mrn", "declared_type": "VARCHAR(20)", "explanation": "Medical record number"},
                    {"name": "admit_dt_tm", "declared_type": null}
                ]
            }
        ]
    }"#;
    let catalog: CatalogModel = serde_json::from_str(json).expect("deserialize catalog");
    let table = catalog.table("Admission / Discharge").expect("table present");
    assert_eq!(table.columns[0].declared_type, DeclaredType::Varchar);
    assert_eq!(
        table.columns[1].declared_type,
        DeclaredType::Other(String::new())
    );
    assert_eq!(table.columns[1].explanation, "");
}

#[test]
fn from_tables_drops_duplicate_columns() {
    let mut entry = TableEntry::new("Laboratory Result");
    entry
        .columns
        .push(ColumnDescriptor::new("result_val", DeclaredType::Decimal, ""));
    entry
        .columns
        .push(ColumnDescriptor::new("result_val", DeclaredType::Varchar, ""));
    let catalog = CatalogModel::from_tables(vec![entry]).expect("valid tables");
    assert_eq!(catalog.column_count(), 1);
    assert_eq!(
        catalog.tables()[0].columns[0].declared_type,
        DeclaredType::Decimal
    );
}

#[test]
fn from_tables_rejects_blank_names() {
    let err = CatalogModel::from_tables(vec![TableEntry::new("  ")]).unwrap_err();
    assert_eq!(err, ModelError::EmptyTableName);

    let mut entry = TableEntry::new("Census");
    entry
        .columns
        .push(ColumnDescriptor::new(" ", DeclaredType::Varchar, ""));
    let err = CatalogModel::from_tables(vec![entry]).unwrap_err();
    assert!(matches!(err, ModelError::EmptyColumnName { ref table } if table == "Census"));
}

#[test]
fn target_record_serializes_flat() {
    let mut record = TargetRecord::new("visit_occurrence");
    record.insert("person_id", CellValue::text("MRN001"));
    record.insert("visit_occurrence_id", CellValue::Integer(500));
    record.insert("visit_end_date", CellValue::Missing);
    let json = serde_json::to_value(&record).expect("serialize record");
    assert_eq!(
        json,
        serde_json::json!({
            "_target_table": "visit_occurrence",
            "person_id": "MRN001",
            "visit_occurrence_id": 500,
            "visit_end_date": null
        })
    );
    assert_eq!(record.get_str("visit_end_date"), None);
    assert_eq!(record.get_str("visit_occurrence_id").as_deref(), Some("500"));
}

#[test]
fn mapping_counts_by_confidence() {
    let mapping = FieldMapping {
        entries: vec![
            MappingEntry::mapped("person", "person_id", "A", "mrn", MatchConfidence::Exact),
            MappingEntry::mapped("person", "year_of_birth", "A", "dob", MatchConfidence::Normalized),
            MappingEntry::unmapped("person", "race_concept_id"),
        ],
        ..FieldMapping::default()
    };
    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.mapped().count(), 2);
    assert_eq!(mapping.count_with(MatchConfidence::Unmapped), 1);
    assert_eq!(mapping.source_tables(), vec!["A"]);
}

#[test]
fn diagnostics_count_warnings() {
    let diagnostics = vec![
        Diagnostic::warning(DiagnosticCode::UnresolvedTable, "no table").with_table("Foo"),
        Diagnostic::info(DiagnosticCode::UnparseableValue, "kept text"),
    ];
    assert_eq!(warning_count(&diagnostics), 1);
    assert_eq!(diagnostics[0].to_string(), "[unresolved_table] no table");
}
