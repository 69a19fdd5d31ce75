use omop_map::{ReconcileOptions, Reconciler, TableAliases, reconcile};
use omop_model::{
    CatalogModel, ColumnDescriptor, DeclaredType, DiagnosticCode, MatchConfidence, SourceField,
    TargetField, TargetFieldSpec,
};

fn push(catalog: &mut CatalogModel, table: &str, column: &str, declared_type: DeclaredType) {
    catalog
        .push_column(table, ColumnDescriptor::new(column, declared_type, ""))
        .expect("valid column");
}

fn admission_catalog() -> CatalogModel {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "Admission - Discharge", "mrn", DeclaredType::Varchar);
    push(&mut catalog, "Admission - Discharge", "encntr_num", DeclaredType::Varchar);
    push(&mut catalog, "Admission - Discharge", "admit_dt_tm", DeclaredType::Datetime);
    catalog
}

#[test]
fn punctuation_mismatch_maps_as_normalized() {
    let catalog = admission_catalog();
    let specs = vec![TargetFieldSpec::new(
        "visit_occurrence",
        "visit_start_date",
        "Admission / Discharge",
        "admit_dt_tm",
    )];

    let result = reconcile(&catalog, &specs);
    let entry = &result.mapping.entries[0];
    assert_eq!(entry.match_confidence, MatchConfidence::Normalized);
    assert_eq!(entry.source_table, "Admission - Discharge");
    assert_eq!(entry.source_column, "admit_dt_tm");
    assert!(result.mapping.unmatched_target_fields.is_empty());
    assert_eq!(
        result.mapping.unclaimed_source_fields,
        vec![
            SourceField::new("Admission - Discharge", "mrn"),
            SourceField::new("Admission - Discharge", "encntr_num"),
        ]
    );
}

#[test]
fn every_spec_yields_one_entry_in_order() {
    let catalog = admission_catalog();
    let specs = vec![
        TargetFieldSpec::new("person", "person_id", "Admission - Discharge", "mrn"),
        TargetFieldSpec::new("person", "gender_concept_id", "Demographics", "sex_cd"),
        TargetFieldSpec::new("person", "gender_concept_id", "Demographics", "gender"),
        TargetFieldSpec::new("visit_occurrence", "visit_occurrence_id", "admission discharge", "ENCNTR_NUM"),
        TargetFieldSpec::new("person", "race_concept_id", "", ""),
    ];

    let result = reconcile(&catalog, &specs);
    assert_eq!(result.mapping.len(), specs.len());
    for (entry, spec) in result.mapping.entries.iter().zip(&specs) {
        assert_eq!(entry.target_table, spec.target_table);
        assert_eq!(entry.target_column, spec.target_column);
        assert_eq!(entry.source_table.is_empty(), !entry.is_mapped());
    }
    assert_eq!(result.mapping.entries[0].match_confidence, MatchConfidence::Exact);
    assert_eq!(result.mapping.entries[3].match_confidence, MatchConfidence::Normalized);
    assert_eq!(
        result.mapping.unmatched_target_fields,
        vec![
            TargetField::new("person", "gender_concept_id"),
            TargetField::new("person", "race_concept_id"),
        ]
    );
}

#[test]
fn union_prefers_first_declared_variant() {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "Laboratory Result", "result_val", DeclaredType::Decimal);
    push(&mut catalog, "laboratory-result", "result_val", DeclaredType::Varchar);
    push(&mut catalog, "laboratory-result", "result_units", DeclaredType::Varchar);

    let specs = vec![
        TargetFieldSpec::new("measurement", "value_as_number", "LABORATORY RESULT", "result_val"),
        TargetFieldSpec::new("measurement", "unit_source_value", "Laboratory Result", "result_units"),
    ];
    let result = reconcile(&catalog, &specs);

    assert_eq!(result.mapping.entries[0].source_table, "Laboratory Result");
    // Exact table, but the column only exists in another variant.
    assert_eq!(result.mapping.entries[1].source_table, "laboratory-result");
    assert_eq!(
        result.mapping.entries[1].match_confidence,
        MatchConfidence::Normalized
    );
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::AmbiguousTable));
    assert_eq!(
        result.mapping.unclaimed_source_fields,
        vec![SourceField::new("laboratory-result", "result_val")]
    );
}

#[test]
fn prefix_hints_resolve_through_aliases() {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "DAD Diagnosis", "diag_cd", DeclaredType::Varchar);
    push(&mut catalog, "Clinical Event", "event_cd", DeclaredType::Varchar);

    let specs = vec![
        TargetFieldSpec::new("condition_occurrence", "condition_source_value", "DADDiag", "diag_cd"),
        TargetFieldSpec::new("observation", "observation_source_value", "Clinical", "event_cd"),
    ];
    let result = reconcile(&catalog, &specs);
    for entry in &result.mapping.entries {
        assert_eq!(entry.match_confidence, MatchConfidence::Fallback);
    }
    assert_eq!(result.mapping.entries[0].source_table, "DAD Diagnosis");
    assert_eq!(result.mapping.entries[1].source_table, "Clinical Event");
}

#[test]
fn run_together_hints_match_alias_prefixes() {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "DAD Diagnosis", "diag_cd", DeclaredType::Varchar);
    push(&mut catalog, "Admission / Discharge", "mrn", DeclaredType::Varchar);

    let specs = vec![
        TargetFieldSpec::new("condition_occurrence", "condition_source_value", "DADDxCodes", "diag_cd"),
        TargetFieldSpec::new("person", "person_source_value", "AdmissionDischarge", "mrn"),
    ];
    let result = reconcile(&catalog, &specs);
    let entries = &result.mapping.entries;
    assert_eq!(entries[0].match_confidence, MatchConfidence::Fallback);
    assert_eq!(entries[0].source_table, "DAD Diagnosis");
    assert_eq!(entries[1].match_confidence, MatchConfidence::Fallback);
    assert_eq!(entries[1].source_table, "Admission / Discharge");
    assert!(result.mapping.unmatched_target_fields.is_empty());
}

#[test]
fn raw_table_names_with_padding_match_exactly() {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "Census ", "bed", DeclaredType::Varchar);

    let specs = vec![
        TargetFieldSpec::new("care_site", "care_site_source_value", "Census ", "bed"),
        TargetFieldSpec::new("care_site", "place_of_service_source_value", "Census", "bed"),
    ];
    let result = reconcile(&catalog, &specs);
    assert_eq!(result.mapping.entries[0].match_confidence, MatchConfidence::Exact);
    assert_eq!(result.mapping.entries[0].source_table, "Census ");
    assert_eq!(result.mapping.entries[1].match_confidence, MatchConfidence::Normalized);
}

#[test]
fn containment_fallback_uses_catalog_order() {
    let mut catalog = CatalogModel::new();
    push(&mut catalog, "Surgery Case Completed", "surg_start_dt_tm", DeclaredType::Datetime);
    push(&mut catalog, "Surgery Case Scheduled", "surg_start_dt_tm", DeclaredType::Datetime);

    let spec = TargetFieldSpec::new("procedure_occurrence", "procedure_datetime", "surgery case", "surg_start_dt_tm");
    let result = Reconciler::new(&catalog)
        .with_aliases(TableAliases::empty())
        .reconcile(std::slice::from_ref(&spec));
    assert_eq!(result.mapping.entries[0].source_table, "Surgery Case Completed");
    assert_eq!(result.mapping.entries[0].match_confidence, MatchConfidence::Fallback);

    let strict = Reconciler::new(&catalog)
        .with_options(ReconcileOptions {
            fallback_matching: false,
        })
        .reconcile(&[spec]);
    assert!(!strict.mapping.entries[0].is_mapped());
    assert_eq!(strict.diagnostics[0].code, DiagnosticCode::UnresolvedTable);
}

#[test]
fn reconciliation_is_deterministic() {
    let catalog = admission_catalog();
    let specs = vec![
        TargetFieldSpec::new("visit_occurrence", "visit_start_date", "Admission / Discharge", "admit_dt_tm"),
        TargetFieldSpec::new("person", "person_id", "Admission", "mrn"),
        TargetFieldSpec::new("person", "year_of_birth", "Admission", "birth_yr"),
    ];
    let first = reconcile(&catalog, &specs);
    let second = reconcile(&catalog, &specs);
    assert_eq!(first.mapping, second.mapping);
    assert_eq!(first.diagnostics, second.diagnostics);
}
