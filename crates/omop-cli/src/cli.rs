//! CLI argument definitions for the `omop` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "omop",
    version,
    about = "Reconcile the IHID catalog with the OMOP CDM and transform IHID extracts",
    long_about = "Reconcile the IHID source catalog with the OMOP CDM target schema.\n\n\
                  Builds a field mapping from the mapping spreadsheet export, measures its\n\
                  coverage and uses it to turn IHID CSV extracts into OMOP records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient-level values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a field mapping from the catalog and the target schema.
    Map(MapArgs),

    /// Report mapping coverage and gate on minimum ratios.
    Validate(ValidateArgs),

    /// Transform IHID extracts into per-table OMOP JSON files.
    Etl(EtlArgs),

    /// Regenerate the catalog JSON from a directory of extracts.
    Catalog(CatalogArgs),
}

/// Inputs shared by `map` and `validate`.
#[derive(Args)]
pub struct SchemaInputs {
    /// IHID catalog JSON (All_Tables_Combined.json).
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: PathBuf,

    /// CSV export of the OMOP schema mapping sheet.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub inputs: SchemaInputs,

    /// Where to write the mapping document.
    #[arg(long = "output", value_name = "PATH", default_value = "mapping.json")]
    pub output: PathBuf,

    /// JSON object of extra table aliases (alias to table name or names).
    #[arg(long = "table-aliases", value_name = "PATH")]
    pub table_aliases: Option<PathBuf>,

    /// Only accept exact and normalized table names.
    #[arg(long = "no-fallback")]
    pub no_fallback: bool,

    /// Free-text description stored in the mapping document.
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: SchemaInputs,

    /// Mapping document produced by `omop map`.
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: PathBuf,

    /// Directory for coverage_report.json.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Minimum share of target fields that must be mapped (0.0 to 1.0).
    #[arg(long = "min-target-ratio", value_name = "RATIO", default_value_t = 0.0)]
    pub min_target_ratio: f64,

    /// Minimum share of catalog columns that must be mapped (0.0 to 1.0).
    #[arg(long = "min-source-ratio", value_name = "RATIO", default_value_t = 0.0)]
    pub min_source_ratio: f64,

    /// Number of target tables listed in the gap ranking.
    #[arg(long = "top", value_name = "N", default_value_t = 10)]
    pub top: usize,
}

#[derive(Args)]
pub struct EtlArgs {
    /// Directory of IHID CSV extracts.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Mapping document produced by `omop map`.
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: PathBuf,

    /// Output directory (default: <DATA_DIR>/omop).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Copy values verbatim instead of converting them to the target column kind.
    #[arg(long = "no-convert")]
    pub no_convert: bool,

    /// First synthetic identifier counter value, for partitioned runs.
    #[arg(long = "synthetic-offset", value_name = "N", default_value_t = 0)]
    pub synthetic_offset: u64,

    /// Extra column holding the patient identifier (repeatable).
    #[arg(long = "patient-column", value_name = "COLUMN")]
    pub patient_columns: Vec<String>,

    /// Extra column holding the medical record number (repeatable).
    #[arg(long = "mrn-column", value_name = "COLUMN")]
    pub mrn_columns: Vec<String>,

    /// Extra column holding the encounter number (repeatable).
    #[arg(long = "encounter-column", value_name = "COLUMN")]
    pub encounter_columns: Vec<String>,

    /// Transform and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CatalogArgs {
    /// Directory of IHID CSV extracts.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Where to write the catalog JSON.
    #[arg(long = "output", value_name = "PATH", default_value = "All_Tables_Combined.json")]
    pub output: PathBuf,

    /// Rows sampled per file for type inference.
    #[arg(long = "sample-rows", value_name = "N", default_value_t = omop_ingest::DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
