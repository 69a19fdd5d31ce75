//! Coverage validation of a field mapping against both schemas.

mod coverage;
mod gating;
mod report;

pub use coverage::validate;
pub use gating::{AcceptanceThreshold, GateDecision};
pub use report::{
    CoverageReport, CoverageReportPayload, CoverageStat, TableGap, write_coverage_report_json,
};
