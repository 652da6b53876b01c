//! Subscriber setup for the `dixon` binary.
//!
//! Library crates only emit events and spans; the binary installs one
//! subscriber per process. Pipeline crates log at the requested level while
//! dependencies (zip, dicom, nifti) are held at `warn` unless the user asks
//! for less.
//!
//! | level   | emitted for                                          |
//! |---------|------------------------------------------------------|
//! | `error` | failed series, failed patients, fatal errors         |
//! | `warn`  | missing swap record, skipped sites, open studies     |
//! | `info`  | site and patient progress, skipped studies, entries  |
//! | `debug` | ignored archives and series, classification details  |
//! | `trace` | per-file detail                                      |

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Targets raised to the requested level.
const PIPELINE_TARGETS: [&str; 9] = [
    "dixon",
    "dixon_cli",
    "dixon_core",
    "dixon_ingest",
    "dixon_map",
    "dixon_output",
    "dixon_report",
    "dixon_standards",
    "dixon_volume",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored when the terminal allows it.
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event, with the patient and site spans attached.
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` replace the level-derived filter.
    pub use_env_filter: bool,
    pub with_timestamps: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::INFO,
            use_env_filter: true,
            with_timestamps: false,
            with_ansi: true,
            format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Routes output to `path`; file output is timestamped.
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.with_timestamps = path.is_some();
        self.log_file = path;
        self
    }

    fn layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = fmt::layer().with_writer(writer).with_target(false);
        match (self.format, self.with_timestamps) {
            (LogFormat::Json, _) => base
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            (LogFormat::Compact, true) => base.compact().with_ansi(self.with_ansi).boxed(),
            (LogFormat::Compact, false) => base
                .compact()
                .with_ansi(self.with_ansi)
                .without_time()
                .boxed(),
            (LogFormat::Pretty, true) => base.with_ansi(self.with_ansi).boxed(),
            (LogFormat::Pretty, false) => base.with_ansi(self.with_ansi).without_time().boxed(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let directive = filter_directive(self.level_filter);
        if self.use_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
        } else {
            EnvFilter::new(directive)
        }
    }
}

/// Installs the global subscriber. Call once, before the first event.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let layer = match &config.log_file {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            config.layer(Mutex::new(file))
        }
        None => config.layer(io::stderr),
    };
    tracing_subscriber::registry()
        .with(layer)
        .with(config.env_filter())
        .init();
    Ok(())
}

/// Filter directive: pipeline targets at `level`, everything else at most `warn`.
pub fn filter_directive(level: LevelFilter) -> String {
    let mut directive = level.min(LevelFilter::WARN).to_string();
    for target in PIPELINE_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive.to_lowercase()
}
