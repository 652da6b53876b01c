//! Shared helpers for CSV reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dixon_model::Site;
use serde::Serialize;

/// Default file name of the swap-record template.
pub const SWAP_TEMPLATE_FILE: &str = "fat_water_swap_record.csv";
/// Default file name of the Dixon count table.
pub const DIXON_COUNTS_FILE: &str = "dixon_data.csv";

/// Order in which sites appear in every report.
pub const REPORT_SITES: [Site; 4] = [Site::Leeds, Site::Sheffield, Site::Bari, Site::Turku];

/// What happened to a report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Written { path: PathBuf, rows: usize },
    /// The file already existed and was left alone.
    Skipped { path: PathBuf },
}

impl ReportOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ReportOutcome::Written { path, .. } | ReportOutcome::Skipped { path } => path,
        }
    }
}

/// Serializes `rows` as CSV with a header line.
pub fn render_csv<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).context("failed to serialize report row")?;
    }
    let bytes = writer.into_inner().context("failed to flush report")?;
    String::from_utf8(bytes).context("report is not valid UTF-8")
}

/// `Skipped` when a report is already present at `path`.
pub(crate) fn existing_report(path: &Path) -> Option<ReportOutcome> {
    path.exists().then(|| {
        tracing::info!(path = %path.display(), "report already exists, skipping");
        ReportOutcome::Skipped {
            path: path.to_path_buf(),
        }
    })
}

pub(crate) fn write_report(path: &Path, content: &str, rows: usize) -> Result<ReportOutcome> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows, "report written");
    Ok(ReportOutcome::Written {
        path: path.to_path_buf(),
        rows,
    })
}
