use serde::{Deserialize, Serialize};

use crate::report::{CoverageReport, CoverageStat};

/// Minimum field coverage a mapping must reach to be accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceThreshold {
    pub min_target_field_ratio: f64,
    pub min_source_field_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub passed: bool,
    pub failures: Vec<String>,
}

impl CoverageReport {
    pub fn evaluate(&self, threshold: &AcceptanceThreshold) -> GateDecision {
        let mut failures = Vec::new();
        check(
            &mut failures,
            "target field",
            &self.target_fields,
            threshold.min_target_field_ratio,
        );
        check(
            &mut failures,
            "source field",
            &self.source_fields,
            threshold.min_source_field_ratio,
        );
        if !failures.is_empty() {
            tracing::warn!(failures = failures.len(), "Mapping coverage below threshold");
        }
        GateDecision {
            passed: failures.is_empty(),
            failures,
        }
    }
}

fn check(failures: &mut Vec<String>, label: &str, stat: &CoverageStat, minimum: f64) {
    if stat.ratio() < minimum {
        failures.push(format!(
            "{label} coverage {:.1}% is below the required {:.1}% ({} of {} mapped)",
            stat.ratio() * 100.0,
            minimum * 100.0,
            stat.mapped,
            stat.total
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn report(target: CoverageStat, source: CoverageStat) -> CoverageReport {
        CoverageReport {
            source_tables: CoverageStat::new(0, 0),
            source_fields: source,
            target_tables: CoverageStat::new(0, 0),
            target_fields: target,
            unmapped_source_tables: Vec::new(),
            unmapped_source_fields: BTreeMap::new(),
            unmapped_target_tables: Vec::new(),
            unmapped_target_fields: BTreeMap::new(),
            gaps: Vec::new(),
            confidence: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn default_threshold_always_passes() {
        let decision = report(CoverageStat::new(10, 0), CoverageStat::new(0, 0))
            .evaluate(&AcceptanceThreshold::default());
        assert!(decision.passed);
        assert!(decision.failures.is_empty());
    }

    #[test]
    fn each_side_below_threshold_is_a_failure() {
        let threshold = AcceptanceThreshold {
            min_target_field_ratio: 0.8,
            min_source_field_ratio: 0.5,
        };
        let decision =
            report(CoverageStat::new(10, 7), CoverageStat::new(4, 1)).evaluate(&threshold);
        assert!(!decision.passed);
        assert_eq!(decision.failures.len(), 2);
        assert!(decision.failures[0].starts_with("target field coverage 70.0%"));

        let decision =
            report(CoverageStat::new(10, 8), CoverageStat::new(4, 2)).evaluate(&threshold);
        assert!(decision.passed);
    }
}
