use dixon_model::{Acquisition, PatientId, RawSeries, Role, Site, Study};

use super::{Classification, SiteAdapter, ibeat_folder, patient_id, split_at_char};
use crate::error::ClassifyError;

/// Series numbers below this value are pre-contrast acquisitions.
const POST_CONTRAST_FIRST_SERIES: u32 = 20;

/// Position of the Dixon role in `ImageType`.
const IMAGE_TYPE_ROLE_INDEX: usize = 3;

/// Leeds GE exports: one archive entry per Dixon image type.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeedsAdapter;

impl SiteAdapter for LeedsAdapter {
    fn site(&self) -> Site {
        Site::Leeds
    }

    fn normalize_id(&self, folder: &str) -> Result<(PatientId, Study), ClassifyError> {
        let candidate = ibeat_folder(folder).unwrap_or_else(|| {
            let count = folder.chars().count();
            let last7: String = folder.chars().skip(count.saturating_sub(7)).collect();
            split_at_char(&last7, 4)
        });
        Ok((patient_id(folder, &candidate)?, Study::Baseline))
    }

    fn classify(&self, series: &RawSeries) -> Result<Classification, ClassifyError> {
        let number = series
            .index()
            .or_else(|| {
                series
                    .tags
                    .series_number
                    .and_then(|n| u32::try_from(n).ok())
            })
            .ok_or(ClassifyError::MissingTag("SeriesNumber"))?;
        let acquisition = if number < POST_CONTRAST_FIRST_SERIES {
            Acquisition::Dixon
        } else {
            Acquisition::DixonPostContrast
        };
        let label = series
            .tags
            .image_type
            .get(IMAGE_TYPE_ROLE_INDEX)
            .map(|label| label.as_str().trim())
            .filter(|label| !label.is_empty())
            .ok_or(ClassifyError::MissingTag("ImageType"))?;
        Ok(Classification::Single {
            acquisition,
            role: role_from_image_type(label),
        })
    }
}

/// Unrecognised labels pass through verbatim.
fn role_from_image_type(label: &str) -> Role {
    match label {
        "IN_PHASE" => Role::InPhase,
        "OUT_PHASE" => Role::OutPhase,
        "WATER" => Role::Water,
        "FAT" => Role::Fat,
        other => Role::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use dixon_model::SeriesTags;

    use super::*;

    fn series(entry: &str, image_type: &[&str]) -> RawSeries {
        RawSeries {
            site: Site::Leeds,
            patient_folder: "iBE-4128-007".to_string(),
            entry_name: entry.to_string(),
            tags: SeriesTags {
                image_type: image_type.iter().map(ToString::to_string).collect(),
                ..SeriesTags::default()
            },
        }
    }

    #[test]
    fn normalizes_both_folder_styles() {
        let adapter = LeedsAdapter;
        let (id, study) = adapter.normalize_id("iBE-4128-007").unwrap();
        assert_eq!(id.as_str(), "4128_007");
        assert_eq!(study, Study::Baseline);
        let (id, _) = adapter.normalize_id("Leeds_Patient_4128012").unwrap();
        assert_eq!(id.as_str(), "4128_012");
        assert!(adapter.normalize_id("iBE-41-7").is_err());
    }

    #[test]
    fn series_number_selects_acquisition() {
        let adapter = LeedsAdapter;
        let pre = adapter
            .classify(&series("series_19", &["ORIGINAL", "PRIMARY", "OTHER", "FAT"]))
            .unwrap();
        assert_eq!(
            pre,
            Classification::Single {
                acquisition: Acquisition::Dixon,
                role: Role::Fat
            }
        );
        let post = adapter
            .classify(&series("series_20", &["ORIGINAL", "PRIMARY", "OTHER", "WATER"]))
            .unwrap();
        assert_eq!(post.acquisition(), Acquisition::DixonPostContrast);
    }

    #[test]
    fn unknown_image_type_passes_through() {
        let classified = LeedsAdapter
            .classify(&series("series_09", &["DERIVED", "PRIMARY", "OTHER", "T2STAR"]))
            .unwrap();
        assert_eq!(
            classified,
            Classification::Single {
                acquisition: Acquisition::Dixon,
                role: Role::Other("T2STAR".to_string())
            }
        );
    }

    #[test]
    fn short_image_type_is_missing_tag() {
        let err = LeedsAdapter
            .classify(&series("series_04", &["ORIGINAL", "PRIMARY"]))
            .unwrap_err();
        assert_eq!(err, ClassifyError::MissingTag("ImageType"));
        let blank = LeedsAdapter
            .classify(&series("series_04", &["ORIGINAL", "PRIMARY", "OTHER", " "]))
            .unwrap_err();
        assert_eq!(blank, ClassifyError::MissingTag("ImageType"));
    }

    #[test]
    fn falls_back_to_series_number_tag() {
        let mut raw = series("localizer", &["ORIGINAL", "PRIMARY", "OTHER", "IN_PHASE"]);
        assert_eq!(
            LeedsAdapter.classify(&raw).unwrap_err(),
            ClassifyError::MissingTag("SeriesNumber")
        );
        raw.tags.series_number = Some(26);
        assert_eq!(
            LeedsAdapter.classify(&raw).unwrap().acquisition(),
            Acquisition::DixonPostContrast
        );
    }
}
