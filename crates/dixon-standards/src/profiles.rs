//! Per-site export conventions.
//!
//! A profile captures everything about a site that is layout or curation
//! rather than naming: where the export lives, which archive entries are
//! ignored, how series are written and which known defects are repaired.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use dixon_model::{Acquisition, CanonicalSeriesName, PatientId, Role, SeriesGroup, Site};

/// Order in which a patient's canonical series reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrder {
    /// Each series is persisted as soon as it is named.
    Streaming,
    /// All series are named first, then persisted in canonical order.
    Canonical,
}

/// A patient whose export stores every image as its own series.
///
/// Images are regrouped by SeriesNumber and named from `table`.
#[derive(Debug, Clone, Copy)]
pub struct RegroupedPatient {
    pub patient: &'static str,
    pub table: &'static [(i32, Acquisition, Role)],
}

impl RegroupedPatient {
    pub fn matches(&self, patient: &PatientId) -> bool {
        self.patient == patient.as_str()
    }

    /// Canonical name for images carrying `series_number`.
    pub fn name_for(&self, series_number: i32) -> Option<CanonicalSeriesName> {
        self.table
            .iter()
            .find(|(number, _, _)| *number == series_number)
            .map(|(_, acquisition, role)| SeriesGroup::first(*acquisition).name(role.clone()))
    }
}

/// A calibrated run of missing interior slices in one echo-split series.
#[derive(Debug, Clone)]
pub struct SliceGapRecord {
    pub patient: &'static str,
    pub acquisition: Acquisition,
    pub repetition: u32,
    pub role: Role,
    /// Slice location of the last good slice before the gap.
    pub after_location: f64,
    /// Number of consecutive slices missing after it.
    pub missing: usize,
}

impl SliceGapRecord {
    pub fn group(&self) -> SeriesGroup {
        SeriesGroup {
            acquisition: self.acquisition,
            repetition: self.repetition,
        }
    }

    pub fn applies_to(&self, patient: &PatientId, group: SeriesGroup, role: &Role) -> bool {
        self.patient == patient.as_str() && self.group() == group && self.role == *role
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub site: Site,
    /// Export directory relative to the download root.
    pub download_dir: &'static str,
    /// Patient folders hold a single experiment folder with the archives.
    pub experiment_level: bool,
    /// Archive entries whose name contains this marker are ignored.
    pub entry_exclude_marker: Option<&'static str>,
    pub write_order: WriteOrder,
    pub apply_swap_record: bool,
    pub regrouped_patients: &'static [RegroupedPatient],
    pub slice_gaps: &'static [SliceGapRecord],
}

const LEEDS_REGROUPED: &[RegroupedPatient] = &[RegroupedPatient {
    patient: "4128_054",
    table: &[
        (4, Acquisition::Dixon, Role::OutPhase),
        (5, Acquisition::Dixon, Role::InPhase),
        (6, Acquisition::Dixon, Role::Fat),
        (7, Acquisition::Dixon, Role::Water),
        (41, Acquisition::DixonPostContrast, Role::OutPhase),
        (42, Acquisition::DixonPostContrast, Role::InPhase),
        (43, Acquisition::DixonPostContrast, Role::Fat),
        (44, Acquisition::DixonPostContrast, Role::Water),
    ],
}];

const BARI_SLICE_GAPS: &[SliceGapRecord] = &[
    SliceGapRecord {
        patient: "1128_030",
        acquisition: Acquisition::Dixon,
        repetition: 1,
        role: Role::OutPhase,
        after_location: 11.635_744_288_072_8,
        missing: 2,
    },
    SliceGapRecord {
        patient: "1128_030",
        acquisition: Acquisition::Dixon,
        repetition: 1,
        role: Role::InPhase,
        after_location: 13.135_746_735_542_8,
        missing: 1,
    },
];

static LEEDS: SiteProfile = SiteProfile {
    site: Site::Leeds,
    download_dir: "BEAt-DKD-WP4-Leeds/Leeds_Patients",
    experiment_level: false,
    entry_exclude_marker: None,
    write_order: WriteOrder::Streaming,
    apply_swap_record: false,
    regrouped_patients: LEEDS_REGROUPED,
    slice_gaps: &[],
};

static BARI: SiteProfile = SiteProfile {
    site: Site::Bari,
    download_dir: "BEAt-DKD-WP4-Bari/Bari_Patients",
    experiment_level: false,
    entry_exclude_marker: Some("OT"),
    write_order: WriteOrder::Streaming,
    apply_swap_record: false,
    regrouped_patients: &[],
    slice_gaps: BARI_SLICE_GAPS,
};

static SHEFFIELD: SiteProfile = SiteProfile {
    site: Site::Sheffield,
    download_dir: "BEAt-DKD-WP4-Sheffield",
    experiment_level: true,
    entry_exclude_marker: None,
    write_order: WriteOrder::Canonical,
    apply_swap_record: true,
    regrouped_patients: &[],
    slice_gaps: &[],
};

static TURKU: SiteProfile = SiteProfile {
    site: Site::Turku,
    download_dir: "BEAt-DKD-WP4-Turku/Turku_Patients",
    experiment_level: false,
    entry_exclude_marker: None,
    write_order: WriteOrder::Canonical,
    apply_swap_record: false,
    regrouped_patients: &[],
    slice_gaps: &[],
};

impl SiteProfile {
    pub fn for_site(site: Site) -> &'static SiteProfile {
        match site {
            Site::Leeds => &LEEDS,
            Site::Bari => &BARI,
            Site::Sheffield => &SHEFFIELD,
            Site::Turku => &TURKU,
        }
    }

    pub fn download_path(&self, download_root: &Path) -> PathBuf {
        download_root.join(self.download_dir)
    }

    /// Whether an archive entry should be ingested at all.
    pub fn accepts_entry(&self, entry_name: &str) -> bool {
        self.entry_exclude_marker
            .is_none_or(|marker| !entry_name.contains(marker))
    }

    pub fn regrouped(&self, patient: &PatientId) -> Option<&'static RegroupedPatient> {
        self.regrouped_patients.iter().find(|r| r.matches(patient))
    }

    pub fn slice_gap(
        &self,
        patient: &PatientId,
        group: SeriesGroup,
        role: &Role,
    ) -> Option<&'static SliceGapRecord> {
        self.slice_gaps
            .iter()
            .find(|gap| gap.applies_to(patient, group, role))
    }
}
