//! Blank fat-water swap record for curators.
//!
//! One row per stored fat/water group with `Swapped` preset to `0`, in the
//! column layout the swap-record loader reads back.

use std::path::Path;

use anyhow::{Context, Result};
use dixon_model::{Role, Site};
use dixon_output::CanonicalDatabase;
use serde::Serialize;

use crate::common::{REPORT_SITES, ReportOutcome, existing_report, render_csv, write_report};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapTemplateRow {
    #[serde(rename = "Site")]
    pub site: String,
    #[serde(rename = "Patient")]
    pub patient: String,
    #[serde(rename = "Study")]
    pub study: String,
    /// Series group, e.g. `Dixon_post_contrast_1`.
    #[serde(rename = "Series")]
    pub series: String,
    #[serde(rename = "Swapped")]
    pub swapped: u8,
}

/// Template rows for every site in report order.
pub fn swap_template_rows(db: &CanonicalDatabase) -> Result<Vec<SwapTemplateRow>> {
    let mut rows = Vec::new();
    for site in REPORT_SITES {
        rows.extend(site_rows(db, site)?);
    }
    Ok(rows)
}

fn site_rows(db: &CanonicalDatabase, site: Site) -> Result<Vec<SwapTemplateRow>> {
    let mut rows = Vec::new();
    for stored in db
        .studies(site)
        .with_context(|| format!("failed to list {site} studies"))?
    {
        let names = db
            .series(site, &stored.patient, stored.study)
            .with_context(|| format!("failed to list series of {}", stored.patient))?;
        rows.extend(
            names
                .iter()
                .filter(|name| name.role == Role::Fat)
                .map(|name| SwapTemplateRow {
                    site: site.to_string(),
                    patient: stored.patient.to_string(),
                    study: stored.study.to_string(),
                    series: name.group().to_string(),
                    swapped: 0,
                }),
        );
    }
    Ok(rows)
}

pub fn render_swap_template(rows: &[SwapTemplateRow]) -> Result<String> {
    render_csv(rows)
}

/// Writes the template to `path`; an existing file is never overwritten.
pub fn write_swap_template(db: &CanonicalDatabase, path: &Path) -> Result<ReportOutcome> {
    if let Some(skipped) = existing_report(path) {
        return Ok(skipped);
    }
    let rows = swap_template_rows(db)?;
    write_report(path, &render_swap_template(&rows)?, rows.len())
}
