//! Dixon repetition counts and the series group to use per study.

use std::path::Path;

use anyhow::{Context, Result};
use dixon_model::{Acquisition, CanonicalSeriesName, PatientId, Role, SeriesGroup, Site, Study};
use dixon_output::CanonicalDatabase;
use serde::Serialize;

use crate::common::{REPORT_SITES, ReportOutcome, existing_report, render_csv, write_report};

/// How many contiguous Dixon repetitions one study holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DixonCount {
    pub site: Site,
    pub patient: PatientId,
    pub study: Study,
    pub dixon: u32,
    pub post_contrast: u32,
}

impl DixonCount {
    /// The last post-contrast repetition if any, else the last plain one.
    pub fn use_series(&self) -> Option<SeriesGroup> {
        [
            (Acquisition::DixonPostContrast, self.post_contrast),
            (Acquisition::Dixon, self.dixon),
        ]
        .into_iter()
        .find_map(|(acquisition, count)| SeriesGroup::new(acquisition, count).ok())
    }

    fn row(&self) -> DixonCountRow {
        DixonCountRow {
            site: self.site.to_string(),
            patient: self.patient.to_string(),
            study: self.study.to_string(),
            dixon: self.dixon,
            post_contrast: self.post_contrast,
            use_series: self
                .use_series()
                .map(|group| group.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DixonCountRow {
    #[serde(rename = "Site")]
    site: String,
    #[serde(rename = "Patient")]
    patient: String,
    #[serde(rename = "Study")]
    study: String,
    #[serde(rename = "Dixon")]
    dixon: u32,
    #[serde(rename = "Dixon_post_contrast")]
    post_contrast: u32,
    #[serde(rename = "Use")]
    use_series: String,
}

/// Counts repetitions whose out-of-phase image is present, starting at 1
/// and stopping at the first gap.
fn contiguous_repetitions(names: &[CanonicalSeriesName], acquisition: Acquisition) -> u32 {
    let mut group = SeriesGroup::first(acquisition);
    let mut count = 0;
    while names.contains(&group.name(Role::OutPhase)) {
        count += 1;
        group = group.next();
    }
    count
}

/// One count per stored study, sites in report order.
pub fn count_dixons(db: &CanonicalDatabase) -> Result<Vec<DixonCount>> {
    let mut counts = Vec::new();
    for site in REPORT_SITES {
        for stored in db
            .studies(site)
            .with_context(|| format!("failed to list {site} studies"))?
        {
            let names = db
                .series(site, &stored.patient, stored.study)
                .with_context(|| format!("failed to list series of {}", stored.patient))?;
            counts.push(DixonCount {
                site,
                dixon: contiguous_repetitions(&names, Acquisition::Dixon),
                post_contrast: contiguous_repetitions(&names, Acquisition::DixonPostContrast),
                patient: stored.patient,
                study: stored.study,
            });
        }
    }
    Ok(counts)
}

pub fn render_dixon_counts(counts: &[DixonCount]) -> Result<String> {
    let rows: Vec<DixonCountRow> = counts.iter().map(DixonCount::row).collect();
    render_csv(&rows)
}

/// Writes the count table to `path`; an existing file is never overwritten.
pub fn write_dixon_counts(db: &CanonicalDatabase, path: &Path) -> Result<ReportOutcome> {
    if let Some(skipped) = existing_report(path) {
        return Ok(skipped);
    }
    let counts = count_dixons(db)?;
    write_report(path, &render_dixon_counts(&counts)?, counts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(dixon: u32, post_contrast: u32) -> DixonCount {
        DixonCount {
            site: Site::Bari,
            patient: PatientId::new("1128_030").unwrap(),
            study: Study::Baseline,
            dixon,
            post_contrast,
        }
    }

    #[test]
    fn post_contrast_is_preferred() {
        assert_eq!(
            count(2, 1).use_series().unwrap().to_string(),
            "Dixon_post_contrast_1"
        );
        assert_eq!(count(3, 0).use_series().unwrap().to_string(), "Dixon_3");
        assert_eq!(count(0, 0).use_series(), None);
    }

    #[test]
    fn counting_stops_at_first_gap() {
        let names: Vec<CanonicalSeriesName> = [
            "Dixon_1_out_phase",
            "Dixon_2_out_phase",
            "Dixon_4_out_phase",
            "Dixon_3_fat",
        ]
        .iter()
        .map(|n| n.parse().unwrap())
        .collect();
        assert_eq!(contiguous_repetitions(&names, Acquisition::Dixon), 2);
        assert_eq!(contiguous_repetitions(&names, Acquisition::DixonPostContrast), 0);
    }
}
