//! Site naming adapters.
//!
//! Every contributing site exports its Dixon series under its own naming
//! convention. A [`SiteAdapter`] turns the tag values of one raw series into
//! a [`Classification`] and a raw patient folder into a [`PatientId`].
//! Adapters are pure: they never touch the filesystem.
//!
//! | Site | Acquisition from | Role from |
//! |------|------------------|-----------|
//! | Leeds | series number (< 20 pre-contrast) | `ImageType[3]` |
//! | Bari | entry suffix (< 1000 pre-contrast) | echo-time split |
//! | Sheffield, Turku | description | Philips: echo time, GE: description table |

mod bari;
mod leeds;
mod vendor;

use dixon_model::{Acquisition, PatientId, RawSeries, Role, Site, Study};

use crate::error::ClassifyError;

pub use bari::BariAdapter;
pub use leeds::LeedsAdapter;
pub use vendor::{GE_DESCRIPTIONS, SheffieldAdapter, TurkuAdapter, ge_lookup};

/// Outcome of classifying one raw series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The series maps to exactly one canonical role.
    Single { acquisition: Acquisition, role: Role },
    /// The series interleaves out-of-phase and in-phase echoes and must be
    /// split by echo time before naming.
    EchoPair { acquisition: Acquisition },
}

impl Classification {
    pub fn acquisition(&self) -> Acquisition {
        match self {
            Classification::Single { acquisition, .. }
            | Classification::EchoPair { acquisition } => *acquisition,
        }
    }
}

/// Tunables shared by all adapters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdapterOptions {
    /// Philips echo times below this value (ms) are out-of-phase.
    pub philips_out_phase_max_echo_ms: f64,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            philips_out_phase_max_echo_ms:
                dixon_standards::config::DEFAULT_PHILIPS_OUT_PHASE_MAX_ECHO_MS,
        }
    }
}

/// Per-site naming rules.
pub trait SiteAdapter: Send + Sync {
    fn site(&self) -> Site;

    /// Derives the harmonized patient id and study from a raw folder name.
    fn normalize_id(&self, folder: &str) -> Result<(PatientId, Study), ClassifyError>;

    /// Maps the tags of one raw series to its acquisition and role.
    fn classify(&self, series: &RawSeries) -> Result<Classification, ClassifyError>;
}

/// Returns the adapter for `site`.
pub fn adapter_for(site: Site, options: AdapterOptions) -> Box<dyn SiteAdapter> {
    match site {
        Site::Leeds => Box::new(LeedsAdapter),
        Site::Bari => Box::new(BariAdapter),
        Site::Sheffield => Box::new(SheffieldAdapter::new(options)),
        Site::Turku => Box::new(TurkuAdapter::new(options)),
    }
}

/// Validates an assembled `cohort_subject` candidate.
pub(crate) fn patient_id(folder: &str, candidate: &str) -> Result<PatientId, ClassifyError> {
    PatientId::new(candidate).map_err(|source| ClassifyError::InvalidPatientId {
        folder: folder.to_string(),
        source,
    })
}

/// `value[start..]` on a character boundary, empty when out of range.
pub(crate) fn tail_from(value: &str, start: usize) -> &str {
    value
        .char_indices()
        .nth(start)
        .map_or("", |(idx, _)| &value[idx..])
}

/// Inserts `_` after the first `at` characters.
pub(crate) fn split_at_char(value: &str, at: usize) -> String {
    let head: String = value.chars().take(at).collect();
    let rest: String = value.chars().skip(at).collect();
    format!("{head}_{rest}")
}

/// Folder names of the form `iBE-4128-007`.
pub(crate) fn ibeat_folder(folder: &str) -> Option<String> {
    folder
        .strip_prefix("iBE")
        .map(|_| tail_from(folder, 4).replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_registry_covers_every_site() {
        for site in Site::ALL {
            assert_eq!(adapter_for(site, AdapterOptions::default()).site(), site);
        }
    }

    #[test]
    fn string_helpers_are_boundary_safe() {
        assert_eq!(tail_from("abc", 5), "");
        assert_eq!(tail_from("iBE-4128-007", 4), "4128-007");
        assert_eq!(split_at_char("4128007", 4), "4128_007");
        assert_eq!(ibeat_folder("iBE-4128-007").as_deref(), Some("4128_007"));
        assert_eq!(ibeat_folder("BEAt4128007"), None);
    }
}
