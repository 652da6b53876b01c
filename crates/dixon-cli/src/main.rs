//! Dixon harmonization CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use dixon_cli::logging::{LogConfig, init_logging};
use dixon_cli::settings::resolve_config;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_count, run_harmonize, run_sites, run_swap_template};
use crate::summary::{print_report_outcome, print_site_reports};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let config = match resolve_config(&cli.config, &cli.paths.overrides()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    };
    let exit_code = match &cli.command {
        Command::Harmonize(args) => match run_harmonize(&config, args) {
            Ok(reports) => {
                print_site_reports(&reports);
                i32::from(reports.iter().any(dixon_core::SiteReport::has_failures))
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::SwapTemplate(args) => report_exit_code(
            "swap record template",
            run_swap_template(&config, args),
        ),
        Command::Count(args) => report_exit_code("dixon counts", run_count(&config, args)),
        Command::Sites => {
            run_sites(&config);
            0
        }
    };
    std::process::exit(exit_code);
}

fn report_exit_code(report: &str, result: anyhow::Result<dixon_report::ReportOutcome>) -> i32 {
    match result {
        Ok(outcome) => {
            print_report_outcome(report, &outcome);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

/// Logging setup from the flags: `--log-level` wins over `-v`/`-q`, which
/// win over `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit = cli.verbosity.is_present() || cli.log_level.is_some();
    let level_filter = cli
        .log_level
        .map_or_else(|| cli.verbosity.tracing_level_filter(), LevelFilter::from);
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    let config = LogConfig {
        level_filter,
        use_env_filter: !explicit,
        with_ansi,
        ..LogConfig::default()
    };
    config
        .with_format(cli.log_format.into())
        .with_log_file(cli.log_file.clone())
}
