use std::path::PathBuf;

use omop_cli::pipeline::TableOutput;
use omop_model::{Diagnostic, FieldMapping};
use omop_transform::TransformStats;
use omop_validate::{CoverageReport, GateDecision};

#[derive(Debug)]
pub struct MapResult {
    pub output: PathBuf,
    pub mapping: FieldMapping,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ValidateResult {
    pub report: CoverageReport,
    pub decision: GateDecision,
    pub report_path: Option<PathBuf>,
    pub top: usize,
}

#[derive(Debug)]
pub struct EtlResult {
    pub output_dir: PathBuf,
    pub stats: TransformStats,
    pub outputs: Vec<TableOutput>,
    pub diagnostics: Vec<Diagnostic>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct CatalogResult {
    pub output: PathBuf,
    pub files: usize,
    pub tables: usize,
    pub columns: usize,
    pub diagnostics: Vec<Diagnostic>,
}
