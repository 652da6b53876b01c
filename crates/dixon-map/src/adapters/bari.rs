use dixon_model::{Acquisition, PatientId, RawSeries, Site, Study};

use super::{Classification, SiteAdapter, ibeat_folder, patient_id, split_at_char};
use crate::error::ClassifyError;

/// Entry suffixes from this value on are post-contrast acquisitions.
const POST_CONTRAST_FIRST_SUFFIX: u32 = 1000;

/// Bari Siemens exports: each entry holds both echoes of one acquisition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BariAdapter;

impl SiteAdapter for BariAdapter {
    fn site(&self) -> Site {
        Site::Bari
    }

    fn normalize_id(&self, folder: &str) -> Result<(PatientId, Study), ClassifyError> {
        let candidate = ibeat_folder(folder).unwrap_or_else(|| split_at_char(folder, 4));
        Ok((patient_id(folder, &candidate)?, Study::Baseline))
    }

    fn classify(&self, series: &RawSeries) -> Result<Classification, ClassifyError> {
        let suffix = series
            .index()
            .ok_or(ClassifyError::MissingTag("SeriesNumber"))?;
        let acquisition = if suffix < POST_CONTRAST_FIRST_SUFFIX {
            Acquisition::Dixon
        } else {
            Acquisition::DixonPostContrast
        };
        Ok(Classification::EchoPair { acquisition })
    }
}

#[cfg(test)]
mod tests {
    use dixon_model::SeriesTags;

    use super::*;

    fn entry(name: &str) -> RawSeries {
        RawSeries {
            site: Site::Bari,
            patient_folder: "1128030".to_string(),
            entry_name: name.to_string(),
            tags: SeriesTags::default(),
        }
    }

    #[test]
    fn suffix_threshold() {
        assert_eq!(
            BariAdapter.classify(&entry("series_999")).unwrap(),
            Classification::EchoPair {
                acquisition: Acquisition::Dixon
            }
        );
        assert_eq!(
            BariAdapter.classify(&entry("series_1000")).unwrap(),
            Classification::EchoPair {
                acquisition: Acquisition::DixonPostContrast
            }
        );
    }

    #[test]
    fn normalizes_plain_and_ibeat_folders() {
        assert_eq!(
            BariAdapter.normalize_id("1128030").unwrap().0.as_str(),
            "1128_030"
        );
        assert_eq!(
            BariAdapter.normalize_id("iBE-1128-031").unwrap().0.as_str(),
            "1128_031"
        );
    }
}
