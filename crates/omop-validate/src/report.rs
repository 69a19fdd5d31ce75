use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use omop_model::{Diagnostic, MatchConfidence, warning_count};

/// Mapped share of one side of the mapping at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageStat {
    pub total: usize,
    pub mapped: usize,
    pub ratio: f64,
}

impl CoverageStat {
    /// An empty side has ratio 0.
    pub fn new(total: usize, mapped: usize) -> Self {
        let mapped = mapped.min(total);
        let ratio = if total == 0 {
            0.0
        } else {
            mapped as f64 / total as f64
        };
        Self {
            total,
            mapped,
            ratio,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn unmapped(&self) -> usize {
        self.total - self.mapped
    }
}

/// Unmapped fields of one target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableGap {
    pub table: String,
    pub unmapped_count: usize,
    pub unmapped_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub source_tables: CoverageStat,
    pub source_fields: CoverageStat,
    pub target_tables: CoverageStat,
    pub target_fields: CoverageStat,
    pub unmapped_source_tables: Vec<String>,
    pub unmapped_source_fields: BTreeMap<String, Vec<String>>,
    pub unmapped_target_tables: Vec<String>,
    pub unmapped_target_fields: BTreeMap<String, Vec<String>>,
    /// Every target table, most unmapped fields first.
    pub gaps: Vec<TableGap>,
    pub confidence: BTreeMap<MatchConfidence, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CoverageReport {
    pub fn warning_count(&self) -> usize {
        warning_count(&self.diagnostics)
    }
}

#[derive(Debug, Serialize)]
pub struct CoverageReportPayload<'a> {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    #[serde(flatten)]
    pub report: &'a CoverageReport,
}

const REPORT_SCHEMA: &str = "omop-reconcile.coverage-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

/// Write `coverage_report.json` into `output_dir`.
pub fn write_coverage_report_json(output_dir: &Path, report: &CoverageReport) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join("coverage_report.json");
    let payload = CoverageReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        report,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(&output_path, format!("{json}\n"))?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_side_has_zero_ratio() {
        let stat = CoverageStat::new(0, 0);
        assert_eq!(stat.ratio(), 0.0);
        assert_eq!(stat.unmapped(), 0);
    }

    #[test]
    fn ratio_is_mapped_over_total() {
        let stat = CoverageStat::new(4, 3);
        assert!((stat.ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(stat.unmapped(), 1);
    }
}
