use anyhow::{Context, Result, bail};
use tracing::info_span;

use omop_cli::pipeline::{self, TransformConfig};
use omop_ingest::{generate_catalog, write_catalog};
use omop_map::{MappingDocument, ReconcileOptions, load_mapping, save_document};
use omop_transform::TransformOptions;
use omop_validate::{AcceptanceThreshold, validate, write_coverage_report_json};

use crate::cli::{CatalogArgs, EtlArgs, MapArgs, ValidateArgs};
use crate::types::{CatalogResult, EtlResult, MapResult, ValidateResult};

pub fn run_map(args: &MapArgs) -> Result<MapResult> {
    let span = info_span!("map", output = %args.output.display());
    let _guard = span.enter();

    let inputs = pipeline::ingest(&args.inputs.catalog, &args.inputs.schema)?;
    let options = ReconcileOptions {
        fallback_matching: !args.no_fallback,
    };
    let reconciliation = pipeline::map(&inputs, args.table_aliases.as_deref(), options)?;

    let mut document = MappingDocument::from_mapping(&reconciliation.mapping);
    if let Some(description) = &args.description {
        document = document.with_description(description.clone());
    }
    let output = save_document(&args.output, &document)
        .with_context(|| format!("write mapping {}", args.output.display()))?;

    let mut diagnostics = inputs.catalog.diagnostics;
    diagnostics.extend(reconciliation.diagnostics);
    Ok(MapResult {
        output,
        mapping: reconciliation.mapping,
        diagnostics,
    })
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let span = info_span!("validate", mapping = %args.mapping.display());
    let _guard = span.enter();

    for (flag, ratio) in [
        ("--min-target-ratio", args.min_target_ratio),
        ("--min-source-ratio", args.min_source_ratio),
    ] {
        if !(0.0..=1.0).contains(&ratio) {
            bail!("{flag} must be between 0 and 1, got {ratio}");
        }
    }
    let inputs = pipeline::ingest(&args.inputs.catalog, &args.inputs.schema)?;
    let mapping = load_mapping(&args.mapping)
        .with_context(|| format!("load mapping {}", args.mapping.display()))?;

    let report = validate(&mapping, &inputs.catalog.catalog, &inputs.schema);
    let decision = report.evaluate(&AcceptanceThreshold {
        min_target_field_ratio: args.min_target_ratio,
        min_source_field_ratio: args.min_source_ratio,
    });
    let report_path = match &args.output_dir {
        Some(dir) => Some(
            write_coverage_report_json(dir, &report)
                .with_context(|| format!("write coverage report to {}", dir.display()))?,
        ),
        None => None,
    };
    Ok(ValidateResult {
        report,
        decision,
        report_path,
        top: args.top,
    })
}

pub fn run_etl(args: &EtlArgs) -> Result<EtlResult> {
    let span = info_span!("etl", data_dir = %args.data_dir.display());
    let _guard = span.enter();

    let mapping = load_mapping(&args.mapping)
        .with_context(|| format!("load mapping {}", args.mapping.display()))?;
    let config = TransformConfig {
        options: TransformOptions {
            convert_values: !args.no_convert,
        },
        synthetic_offset: args.synthetic_offset,
        patient_columns: args.patient_columns.clone(),
        alternate_columns: args.mrn_columns.clone(),
        encounter_columns: args.encounter_columns.clone(),
    };
    let output = pipeline::transform(&args.data_dir, &mapping, &config)?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.data_dir.join("omop"));
    let outputs = if args.dry_run {
        Vec::new()
    } else {
        pipeline::write_target_tables(&output_dir, &output.records)?
    };
    Ok(EtlResult {
        output_dir,
        stats: output.stats,
        outputs,
        diagnostics: output.diagnostics,
        dry_run: args.dry_run,
    })
}

pub fn run_catalog(args: &CatalogArgs) -> Result<CatalogResult> {
    let span = info_span!("catalog", data_dir = %args.data_dir.display());
    let _guard = span.enter();

    if args.sample_rows == 0 {
        bail!("--sample-rows must be at least 1");
    }
    let generated = generate_catalog(&args.data_dir, args.sample_rows)
        .with_context(|| format!("profile source data {}", args.data_dir.display()))?;
    write_catalog(&args.output, &generated.catalog)
        .with_context(|| format!("write catalog {}", args.output.display()))?;
    Ok(CatalogResult {
        output: args.output.clone(),
        files: generated.files,
        tables: generated.catalog.table_count(),
        columns: generated.catalog.column_count(),
        diagnostics: generated.diagnostics,
    })
}
