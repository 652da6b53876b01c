//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use dixon_cli::logging::LogFormat;
use dixon_cli::settings::{ConfigOverrides, SiteSelection};

#[derive(Parser)]
#[command(
    name = "dixon",
    version,
    about = "Harmonize multi-site kidney MRI Dixon exports",
    long_about = "Harmonize multi-site kidney MRI Dixon exports.\n\n\
                  Reads the zipped DICOM series exported per site, names every series\n\
                  canonically, applies curated fat-water swap corrections and stores\n\
                  NIfTI volumes in the harmonized database."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// When to color terminal output.
    #[command(flatten)]
    pub color: Color,

    /// Log level; takes precedence over -v/-q and RUST_LOG.
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Shape of log lines.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Append logs to this file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Pipeline configuration file (defaults apply when it does not exist).
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = "dixon.toml",
        global = true
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub paths: PathArgs,
}

/// Path overrides for values otherwise taken from the config file.
#[derive(Args)]
pub struct PathArgs {
    /// Root of the downloaded archive export.
    #[arg(long = "download-root", value_name = "DIR", global = true)]
    pub download_root: Option<PathBuf>,

    /// Root of the harmonized database.
    #[arg(long = "database-root", value_name = "DIR", global = true)]
    pub database_root: Option<PathBuf>,

    /// Directory receiving the curation reports.
    #[arg(long = "check-root", value_name = "DIR", global = true)]
    pub check_root: Option<PathBuf>,

    /// Curated fat-water swap record (CSV).
    #[arg(long = "swap-record", value_name = "PATH", global = true)]
    pub swap_record: Option<PathBuf>,
}

impl PathArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            download_root: self.download_root.clone(),
            database_root: self.database_root.clone(),
            check_root: self.check_root.clone(),
            swap_record: self.swap_record.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Harmonize the exports of one site, or of every site.
    Harmonize(HarmonizeArgs),

    /// Write the fat-water swap record template for curators.
    SwapTemplate(ReportArgs),

    /// Write the Dixon count table with the series group to use per study.
    Count(ReportArgs),

    /// List the supported sites and their export conventions.
    Sites,
}

#[derive(Parser)]
pub struct HarmonizeArgs {
    /// Site to harmonize (Leeds, Bari, Sheffield, Turku) or `all`.
    #[arg(value_name = "SITE")]
    pub site: SiteSelection,

    /// Do not draw progress bars.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Output file (default: a file in the check root).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Values accepted by `--log-level`.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

/// Values accepted by `--log-format`.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
