//! Tests for catalog and target schema loading.

use std::fs;

use omop_ingest::{
    DEFAULT_SAMPLE_ROWS, IngestError, generate_catalog, load_catalog, load_target_schema,
    read_source_table, write_catalog,
};
use omop_model::{DeclaredType, HintKind};

const SCHEMA_CSV: &str = "\
table_name,field_name,description,IHID Corresponding Table,IHID Corresponding Field (Exact),IHID Corresponding Fields (Non-Exact),Notes
visit_occurrence,visit_occurrence_id,Visit key,Admission / Discharge,encntr_num,,
visit_occurrence,visit_start_date,,Admission / Discharge,admit_dt_tm,\"Admission.reg_dt_tm, Emerg.arrive_dt_tm\",
person,gender_concept_id,,,,,
";

#[test]
fn loads_catalog_document() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("All_Tables_Combined.json");
    fs::write(
        &path,
        r#"[
            {"Source_Section": "Admission - Discharge", "Column Name": "mrn", "Data Type": "VARCHAR", "Explanation": "MRN"},
            {"Source_Section": "Admission - Discharge", "Column Name": "admit_dt_tm", "Data Type": "DATETIME", "Explanation": ""},
            {"Source_Section": "Census", "Column Name": "unit_cd"}
        ]"#,
    )
    .expect("write catalog");

    let load = load_catalog(&path).expect("load catalog");
    assert_eq!(load.catalog.table_count(), 2);
    assert_eq!(load.catalog.column_count(), 3);
    let census = load.catalog.table("Census").expect("census");
    assert_eq!(census.columns[0].declared_type, DeclaredType::Other(String::new()));
}

#[test]
fn malformed_catalog_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("catalog.json");
    fs::write(&path, "{\"not\": \"an array\"}").expect("write");
    let err = load_catalog(&path).expect_err("parse failure");
    assert!(matches!(err, IngestError::JsonParse { .. }));
    assert!(err.to_string().contains("catalog.json"));
}

#[test]
fn loads_target_schema_with_prefixed_hints() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("omop_schema.csv");
    fs::write(&path, SCHEMA_CSV).expect("write schema");

    let schema = load_target_schema(&path).expect("load schema");
    let specs = schema.specs();
    assert_eq!(specs.len(), 5);
    assert_eq!(specs[1].source_column_hint, "admit_dt_tm");
    assert_eq!(specs[2].source_table_hint, "Admission");
    assert_eq!(specs[2].source_column_hint, "reg_dt_tm");
    assert_eq!(specs[2].hint_kind, HintKind::NonExact);
    assert_eq!(specs[3].source_table_hint, "Emerg");
    assert_eq!(specs[4].target_column, "gender_concept_id");
    assert_eq!(schema.tables(), vec!["visit_occurrence", "person"]);
}

#[test]
fn generated_catalog_round_trips_through_document() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = dir.path().join("data");
    fs::create_dir(&data).expect("data dir");
    fs::write(
        data.join("1. admission_discharge.csv"),
        "mrn,encntr_num,admit_dt_tm,los_days,discharge_flag\n\
M1,500,2023-01-01 08:00:00,2.5,true\n\
M2,501,2023-01-02 09:15:00,3,false\n",
    )
    .expect("write data");

    let generated = generate_catalog(&data, DEFAULT_SAMPLE_ROWS).expect("generate");
    assert_eq!(generated.files, 1);
    let table = generated
        .catalog
        .table("Admission / Discharge")
        .expect("derived table name");
    let types: Vec<&DeclaredType> = table.columns.iter().map(|c| &c.declared_type).collect();
    assert_eq!(
        types,
        vec![
            &DeclaredType::Varchar,
            &DeclaredType::Integer,
            &DeclaredType::Datetime,
            &DeclaredType::Decimal,
            &DeclaredType::Boolean,
        ]
    );

    let out = dir.path().join("catalog.json");
    write_catalog(&out, &generated.catalog).expect("write catalog");
    let reloaded = load_catalog(&out).expect("reload");
    assert_eq!(reloaded.catalog, generated.catalog);
}

#[test]
fn source_table_name_comes_from_the_file_name() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("03_admission_discharge.csv");
    fs::write(&path, "MRN,Encntr Num\nM1,500\n").expect("write data");

    let table = read_source_table(&path).expect("read table");
    assert_eq!(table.table_name, "Admission / Discharge");
    assert_eq!(table.headers, vec!["mrn", "encntr_num"]);
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.rows[0]["encntr_num"], "500");
}
