//! Diagnostic output for `omop` runs.
//!
//! Stage summaries go out at `info`, per-table detail at `debug`. Row values
//! (MRNs, encounter numbers, person identifiers) are only ever logged at `trace`
//! and pass through [`redact_value`], so they stay out of the log unless the run
//! was started with `--log-data`.
//!
//! ```ignore
//! use omop_cli::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::default().with_log_data(false))?;
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static PATIENT_DATA_ALLOWED: AtomicBool = AtomicBool::new(false);

/// Logged in place of a row value when `--log-data` is off.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Crates whose events follow the configured level. Everything else stays at warn.
const WORKSPACE_CRATES: &[&str] = &[
    "omop_cli",
    "omop_ingest",
    "omop_map",
    "omop_model",
    "omop_transform",
    "omop_validate",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn log_data_enabled() -> bool {
    PATIENT_DATA_ALLOWED.load(Ordering::Relaxed)
}

/// The value itself when patient data may be logged, otherwise [`REDACTED_VALUE`].
pub fn redact_value(value: &str) -> &str {
    if log_data_enabled() { value } else { REDACTED_VALUE }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// `RUST_LOG`, when set, replaces the per-crate directives.
    pub use_env_filter: bool,
    pub with_timestamps: bool,
    pub with_target: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Appended to instead of stderr.
    pub log_file: Option<PathBuf>,
    pub log_data: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_ansi: true,
            format: LogFormat::Pretty,
            log_file: None,
            log_data: false,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn with_level_filter(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    #[must_use]
    pub fn with_log_data(mut self, enable: bool) -> Self {
        self.log_data = enable;
        self
    }

    /// Directives used when `RUST_LOG` is absent or ignored.
    pub fn directives(&self) -> String {
        let level = self.level_filter.to_string().to_lowercase();
        std::iter::once("warn".to_string())
            .chain(WORKSPACE_CRATES.iter().map(|krate| format!("{krate}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        if self.use_env_filter
            && let Ok(filter) = EnvFilter::try_from_default_env()
        {
            return filter;
        }
        EnvFilter::new(self.directives())
    }
}

/// Install the global subscriber. Call once, before the first command runs.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    match &config.log_file {
        Some(path) => init_logging_with_writer(config, Mutex::new(open_log_file(path)?)),
        None => init_logging_with_writer(config, io::stderr),
    }
    Ok(())
}

pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    PATIENT_DATA_ALLOWED.store(config.log_data, Ordering::Relaxed);
    let layer = format_layer(config, writer).with_filter(config.env_filter());
    tracing_subscriber::registry().with(layer).init();
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn format_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(config.with_target);
    match (config.format, config.with_timestamps) {
        (LogFormat::Json, _) => base.json().boxed(),
        (LogFormat::Compact, true) => base.compact().with_ansi(config.with_ansi).boxed(),
        (LogFormat::Compact, false) => base
            .compact()
            .with_ansi(config.with_ansi)
            .without_time()
            .boxed(),
        (LogFormat::Pretty, true) => base.with_ansi(config.with_ansi).boxed(),
        (LogFormat::Pretty, false) => base.with_ansi(config.with_ansi).without_time().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_raise_only_workspace_crates() {
        let directives = LogConfig::default()
            .with_level_filter(LevelFilter::DEBUG)
            .directives();
        assert!(directives.starts_with("warn,"));
        for krate in WORKSPACE_CRATES {
            assert!(directives.contains(&format!("{krate}=debug")));
        }
    }

    #[test]
    fn patient_values_are_redacted_by_default() {
        assert_eq!(redact_value("M0001"), REDACTED_VALUE);
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("run.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }
}
