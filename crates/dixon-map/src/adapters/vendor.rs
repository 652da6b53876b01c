//! Sheffield and Turku share scanners and protocols, so both branch on the
//! vendor the same way; they only differ in folder naming.

use dixon_model::{Acquisition, PatientId, RawSeries, Role, Site, Study};

use super::{
    AdapterOptions, Classification, SiteAdapter, patient_id, split_at_char, tail_from,
};
use crate::error::ClassifyError;

/// GE series descriptions of the Dixon protocol.
pub const GE_DESCRIPTIONS: [(&str, Acquisition, Role); 8] = [
    (
        "WATER: T1_abdomen_dixon_cor_bh",
        Acquisition::Dixon,
        Role::Water,
    ),
    ("FAT: T1_abdomen_dixon_cor_bh", Acquisition::Dixon, Role::Fat),
    (
        "InPhase: T1_abdomen_dixon_cor_bh",
        Acquisition::Dixon,
        Role::InPhase,
    ),
    (
        "OutPhase: T1_abdomen_dixon_cor_bh",
        Acquisition::Dixon,
        Role::OutPhase,
    ),
    (
        "WATER: T1_abdomen_post_contrast_dixon_cor_bh",
        Acquisition::DixonPostContrast,
        Role::Water,
    ),
    (
        "FAT: T1_abdomen_post_contrast_dixon_cor_bh",
        Acquisition::DixonPostContrast,
        Role::Fat,
    ),
    (
        "InPhase: T1_abdomen_post_contrast_dixon_cor_bh",
        Acquisition::DixonPostContrast,
        Role::InPhase,
    ),
    (
        "OutPhase: T1_abdomen_post_contrast_dixon_cor_bh",
        Acquisition::DixonPostContrast,
        Role::OutPhase,
    ),
];

const POST_CONTRAST_MARKER: &str = "post_contrast";
const SHEFFIELD_TYPO: (&str, &str) = ("2178_157", "7128_157");
const FOLLOWUP_MARKER: &str = "followup";
const TURKU_ID_LEN: usize = 8;

/// Looks up a GE description; exact match only.
pub fn ge_lookup(description: &str) -> Result<(Acquisition, Role), ClassifyError> {
    GE_DESCRIPTIONS
        .iter()
        .find(|(known, _, _)| *known == description)
        .map(|(_, acquisition, role)| (*acquisition, role.clone()))
        .ok_or_else(|| ClassifyError::UnknownSeriesDescription(description.to_string()))
}

fn is_philips(manufacturer: &str) -> bool {
    manufacturer.to_ascii_lowercase().contains("philips")
}

/// Vendor branching common to Sheffield and Turku.
fn classify_by_vendor(
    series: &RawSeries,
    options: AdapterOptions,
) -> Result<Classification, ClassifyError> {
    let tags = &series.tags;
    let manufacturer = tags
        .manufacturer
        .as_deref()
        .ok_or(ClassifyError::MissingTag("Manufacturer"))?;
    let description = tags
        .series_description
        .as_deref()
        .ok_or(ClassifyError::MissingTag("SeriesDescription"))?;

    if is_philips(manufacturer) {
        // Philips exports carry no fat/water images, only the two echoes.
        let echo_time = tags.echo_time.ok_or(ClassifyError::MissingTag("EchoTime"))?;
        let role = if echo_time < options.philips_out_phase_max_echo_ms {
            Role::OutPhase
        } else {
            Role::InPhase
        };
        let acquisition = if description.contains(POST_CONTRAST_MARKER) {
            Acquisition::DixonPostContrast
        } else {
            Acquisition::Dixon
        };
        return Ok(Classification::Single { acquisition, role });
    }

    let (acquisition, role) = ge_lookup(description.trim())?;
    Ok(Classification::Single { acquisition, role })
}

/// Sheffield XNAT exports (`{prefix}{cohort}{subject}/{experiment}/series_NN.zip`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SheffieldAdapter {
    options: AdapterOptions,
}

impl SheffieldAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl SiteAdapter for SheffieldAdapter {
    fn site(&self) -> Site {
        Site::Sheffield
    }

    fn normalize_id(&self, folder: &str) -> Result<(PatientId, Study), ClassifyError> {
        let mut candidate = split_at_char(tail_from(folder, 3), 4);
        if candidate == SHEFFIELD_TYPO.0 {
            candidate = SHEFFIELD_TYPO.1.to_string();
        }
        Ok((patient_id(folder, &candidate)?, Study::Baseline))
    }

    fn classify(&self, series: &RawSeries) -> Result<Classification, ClassifyError> {
        classify_by_vendor(series, self.options)
    }
}

/// Turku exports; follow-up visits live in separate `..._followup` folders.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurkuAdapter {
    options: AdapterOptions,
}

impl TurkuAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl SiteAdapter for TurkuAdapter {
    fn site(&self) -> Site {
        Site::Turku
    }

    fn normalize_id(&self, folder: &str) -> Result<(PatientId, Study), ClassifyError> {
        let normalized = tail_from(folder, 4).replace('-', "_");
        let study = if normalized.contains(FOLLOWUP_MARKER) {
            Study::Followup
        } else {
            Study::Baseline
        };
        let candidate: String = normalized.chars().take(TURKU_ID_LEN).collect();
        Ok((patient_id(folder, &candidate)?, study))
    }

    fn classify(&self, series: &RawSeries) -> Result<Classification, ClassifyError> {
        classify_by_vendor(series, self.options)
    }
}

#[cfg(test)]
mod tests {
    use dixon_model::SeriesTags;

    use super::*;

    fn raw(manufacturer: &str, description: &str, echo_time: Option<f64>) -> RawSeries {
        RawSeries {
            site: Site::Sheffield,
            patient_folder: "BEA7128001".to_string(),
            entry_name: "series_3".to_string(),
            tags: SeriesTags {
                manufacturer: Some(manufacturer.to_string()),
                series_description: Some(description.to_string()),
                echo_time,
                ..SeriesTags::default()
            },
        }
    }

    #[test]
    fn ge_water_description() {
        let adapter = SheffieldAdapter::default();
        let classified = adapter
            .classify(&raw("GE MEDICAL SYSTEMS", "WATER: T1_abdomen_dixon_cor_bh", None))
            .unwrap();
        assert_eq!(
            classified,
            Classification::Single {
                acquisition: Acquisition::Dixon,
                role: Role::Water
            }
        );
    }

    #[test]
    fn ge_unknown_description_is_error() {
        let err = SheffieldAdapter::default()
            .classify(&raw("GE MEDICAL SYSTEMS", "T2_haste_cor", None))
            .unwrap_err();
        assert_eq!(
            err,
            ClassifyError::UnknownSeriesDescription("T2_haste_cor".to_string())
        );
    }

    #[test]
    fn philips_uses_echo_time() {
        let adapter = SheffieldAdapter::new(AdapterOptions::default());
        let out = adapter
            .classify(&raw("Philips Healthcare", "T1w_abdomen_dixon_cor_bh", Some(1.15)))
            .unwrap();
        assert_eq!(
            out,
            Classification::Single {
                acquisition: Acquisition::Dixon,
                role: Role::OutPhase
            }
        );
        let inp = adapter
            .classify(&raw(
                "Philips Healthcare",
                "T1w_abdomen_post_contrast_dixon_cor_bh",
                Some(2.3),
            ))
            .unwrap();
        assert_eq!(
            inp,
            Classification::Single {
                acquisition: Acquisition::DixonPostContrast,
                role: Role::InPhase
            }
        );
    }

    #[test]
    fn philips_threshold_is_configurable() {
        let adapter = TurkuAdapter::new(AdapterOptions {
            philips_out_phase_max_echo_ms: 1.0,
        });
        let classified = adapter
            .classify(&raw("Philips Healthcare", "T1w_abdomen_dixon_cor_bh", Some(1.15)))
            .unwrap();
        assert_eq!(
            classified,
            Classification::Single {
                acquisition: Acquisition::Dixon,
                role: Role::InPhase
            }
        );
    }

    #[test]
    fn philips_without_echo_time() {
        let err = SheffieldAdapter::default()
            .classify(&raw("Philips Healthcare", "T1w_abdomen_dixon_cor_bh", None))
            .unwrap_err();
        assert_eq!(err, ClassifyError::MissingTag("EchoTime"));
    }

    #[test]
    fn sheffield_ids_and_typo() {
        let adapter = SheffieldAdapter::default();
        assert_eq!(adapter.normalize_id("BEA7128001").unwrap().0.as_str(), "7128_001");
        assert_eq!(adapter.normalize_id("BEA2178157").unwrap().0.as_str(), "7128_157");
    }

    #[test]
    fn turku_followup_folder() {
        let adapter = TurkuAdapter::default();
        let (id, study) = adapter.normalize_id("iBE-5128-001").unwrap();
        assert_eq!((id.as_str(), study), ("5128_001", Study::Baseline));
        let (id, study) = adapter.normalize_id("iBE-5128-001-followup").unwrap();
        assert_eq!((id.as_str(), study), ("5128_001", Study::Followup));
    }
}
