use anyhow::{Context, Result, bail};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, info_span, warn};

use dixon_cli::settings::SiteSelection;
use dixon_core::{HarmonizeContext, Harmonizer, SiteReport};
use dixon_model::Site;
use dixon_output::CanonicalDatabase;
use dixon_report::{
    DIXON_COUNTS_FILE, ReportOutcome, SWAP_TEMPLATE_FILE, write_dixon_counts, write_swap_template,
};
use dixon_standards::{HarmonizeConfig, SiteProfile, WriteOrder};
use dixon_volume::DicomFileSource;

use crate::cli::{HarmonizeArgs, ReportArgs};
use crate::summary::apply_table_style;

pub fn run_harmonize(config: &HarmonizeConfig, args: &HarmonizeArgs) -> Result<Vec<SiteReport>> {
    let context = HarmonizeContext::from_config(config)?;
    let harmonizer = Harmonizer::new(context, DicomFileSource::new());
    let mut reports = Vec::new();
    for site in args.site.sites() {
        let run = harmonizer.site(site);
        let export_dir = run.export_dir();
        if !export_dir.is_dir() {
            if args.site == SiteSelection::All {
                warn!(site = %site, path = %export_dir.display(), "no export found, skipping site");
                continue;
            }
            bail!("no {site} export at {}", export_dir.display());
        }

        let _span = info_span!("site", site = %site).entered();
        let patients = run.patients()?;
        let progress = patient_progress(patients.len(), args.no_progress);
        progress.set_prefix(site.to_string());
        let mut report = SiteReport::new(site);
        for folder in &patients {
            progress.set_message(folder.name.clone());
            report.push(run.harmonize(folder));
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(
            patients = report.patients.len(),
            written = report.written(),
            existing = report.existing(),
            failed_series = report.failures().count(),
            "site finished"
        );
        reports.push(report);
    }
    Ok(reports)
}

fn patient_progress(len: usize, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{prefix:>10.bold} [{bar:40.cyan/blue}] {pos}/{len} patients {wide_msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress
}

pub fn run_swap_template(config: &HarmonizeConfig, args: &ReportArgs) -> Result<ReportOutcome> {
    let database = open_database(config)?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| config.check_root.join(SWAP_TEMPLATE_FILE));
    write_swap_template(&database, &path)
}

pub fn run_count(config: &HarmonizeConfig, args: &ReportArgs) -> Result<ReportOutcome> {
    let database = open_database(config)?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| config.check_root.join(DIXON_COUNTS_FILE));
    write_dixon_counts(&database, &path)
}

fn open_database(config: &HarmonizeConfig) -> Result<CanonicalDatabase> {
    CanonicalDatabase::create(&config.database_root)
        .with_context(|| format!("cannot open database {}", config.database_root.display()))
}

pub fn run_sites(config: &HarmonizeConfig) {
    let mut table = Table::new();
    table.set_header(vec![
        "Site",
        "Export",
        "Write order",
        "Swap record",
        "Regrouped",
        "Gap repairs",
    ]);
    apply_table_style(&mut table);
    for site in Site::ALL {
        let profile = SiteProfile::for_site(site);
        let write_order = match profile.write_order {
            WriteOrder::Streaming => "streaming",
            WriteOrder::Canonical => "canonical",
        };
        table.add_row(vec![
            site.to_string(),
            profile
                .download_path(&config.download_root)
                .display()
                .to_string(),
            write_order.to_string(),
            if profile.apply_swap_record { "applied" } else { "-" }.to_string(),
            profile.regrouped_patients.len().to_string(),
            profile.slice_gaps.len().to_string(),
        ]);
    }
    println!("{table}");
}
