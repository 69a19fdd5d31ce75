//! Pipeline stages run end to end over a temporary workspace.

use std::fs;
use std::path::Path;

use omop_cli::pipeline::{TransformConfig, ingest, map, transform, write_target_tables};
use omop_map::{MappingDocument, ReconcileOptions, load_mapping, save_document};
use omop_model::MatchConfidence;

const CATALOG: &str = r#"[
    {"Source_Section": "Admission - Discharge", "Column Name": "mrn", "Data Type": "VARCHAR", "Explanation": "MRN"},
    {"Source_Section": "Admission - Discharge", "Column Name": "encntr_num", "Data Type": "INTEGER", "Explanation": ""},
    {"Source_Section": "Admission - Discharge", "Column Name": "admit_dt_tm", "Data Type": "DATETIME", "Explanation": ""},
    {"Source_Section": "Census", "Column Name": "bed", "Data Type": "VARCHAR", "Explanation": ""}
]"#;

const SCHEMA: &str = "table_name,field_name,description,IHID Corresponding Table,IHID Corresponding Field (Exact),IHID Corresponding Fields (Non-Exact),Notes\n\
person,person_id,,Admission / Discharge,mrn,,\n\
visit_occurrence,visit_occurrence_id,,Admission / Discharge,encntr_num,,\n\
visit_occurrence,visit_start_date,,Admission / Discharge,admit_dt_tm,,\n\
death,death_date,,,,,\n";

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn map_then_transform_writes_one_file_per_target_table() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("catalog.json"), CATALOG);
    write(&root.join("schema.csv"), SCHEMA);
    write(
        &root.join("data/1. admission_discharge.csv"),
        "MRN,Encntr Num,Admit Dt Tm\n,500,2023-01-01 08:00:00\nM2,501,\n",
    );
    write(&root.join("data/2. census.csv"), "mrn,bed\nM1,B1\n");

    let inputs = ingest(&root.join("catalog.json"), &root.join("schema.csv")).unwrap();
    let reconciliation = map(&inputs, None, ReconcileOptions::default()).unwrap();
    let mapping = &reconciliation.mapping;
    assert_eq!(mapping.len(), 4);
    assert_eq!(mapping.count_with(MatchConfidence::Normalized), 3);
    assert_eq!(mapping.count_with(MatchConfidence::Unmapped), 1);

    let mapping_path = save_document(
        &root.join("out/mapping.json"),
        &MappingDocument::from_mapping(mapping),
    )
    .unwrap();
    let loaded = load_mapping(&mapping_path).unwrap();
    assert_eq!(loaded.mapped().count(), 3);

    let output = transform(&root.join("data"), &loaded, &TransformConfig::default()).unwrap();
    assert_eq!(output.stats.rows_read, 3);
    assert_eq!(output.stats.unmapped_tables, vec!["Census"]);

    let outputs = write_target_tables(&root.join("omop"), &output.records).unwrap();
    let tables: Vec<&str> = outputs.iter().map(|o| o.table.as_str()).collect();
    assert_eq!(tables, vec!["person", "visit_occurrence"]);

    let person: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outputs[0].path).unwrap()).unwrap();
    assert_eq!(person[0]["person_id"], "ENC_500");
    assert_eq!(person[1]["person_id"], "M2");

    let visits: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outputs[1].path).unwrap()).unwrap();
    assert_eq!(visits[0]["visit_occurrence_id"], "500");
    assert_eq!(visits[0]["visit_start_date"], "2023-01-01");
    assert!(visits[1].get("visit_start_date").is_none());
}

#[test]
fn extra_role_columns_feed_identifier_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("catalog.json"), CATALOG);
    write(&root.join("schema.csv"), SCHEMA);
    write(
        &root.join("data/admission_discharge.csv"),
        "chart_no,admit_dt_tm\nC9,2023-03-04\n",
    );

    let inputs = ingest(&root.join("catalog.json"), &root.join("schema.csv")).unwrap();
    let mapping = map(&inputs, None, ReconcileOptions::default()).unwrap().mapping;
    let config = TransformConfig {
        alternate_columns: vec!["chart_no".to_string()],
        ..TransformConfig::default()
    };
    let output = transform(&root.join("data"), &mapping, &config).unwrap();
    let person = &output.records["person"][0];
    assert_eq!(person.get_str("person_id").as_deref(), Some("C9"));
}

#[test]
fn missing_schema_header_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("catalog.json"), CATALOG);
    write(&root.join("schema.csv"), "table,field\nperson,person_id\n");

    let error = ingest(&root.join("catalog.json"), &root.join("schema.csv")).unwrap_err();
    assert!(format!("{error:#}").contains("load target schema"));
}
