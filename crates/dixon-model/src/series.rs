//! Canonical and raw series descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::{Acquisition, Role, Site};
use crate::error::ModelError;

/// Acquisition plus repetition: the unit that fat-water swap corrections
/// apply to (`Dixon_2`, `Dixon_post_contrast_1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesGroup {
    pub acquisition: Acquisition,
    pub repetition: u32,
}

impl SeriesGroup {
    pub fn new(acquisition: Acquisition, repetition: u32) -> Result<Self, ModelError> {
        if repetition == 0 {
            return Err(ModelError::ZeroRepetition);
        }
        Ok(Self {
            acquisition,
            repetition,
        })
    }

    /// First repetition of an acquisition.
    pub fn first(acquisition: Acquisition) -> Self {
        Self {
            acquisition,
            repetition: 1,
        }
    }

    pub fn name(&self, role: Role) -> CanonicalSeriesName {
        CanonicalSeriesName {
            acquisition: self.acquisition,
            repetition: self.repetition,
            role,
        }
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            acquisition: self.acquisition,
            repetition: self.repetition + 1,
        }
    }
}

impl fmt::Display for SeriesGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.acquisition, self.repetition)
    }
}

impl FromStr for SeriesGroup {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidSeriesName(s.to_string());
        let (acquisition, rest) = split_acquisition(s).ok_or_else(invalid)?;
        let repetition: u32 = rest.parse().map_err(|_| invalid())?;
        SeriesGroup::new(acquisition, repetition)
    }
}

/// Harmonized series name, serialized as `{acquisition}_{repetition}_{role}`.
///
/// The derived ordering (acquisition, repetition, role) is the canonical
/// database write order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalSeriesName {
    pub acquisition: Acquisition,
    pub repetition: u32,
    pub role: Role,
}

impl CanonicalSeriesName {
    pub fn new(acquisition: Acquisition, repetition: u32, role: Role) -> Result<Self, ModelError> {
        Ok(SeriesGroup::new(acquisition, repetition)?.name(role))
    }

    pub fn group(&self) -> SeriesGroup {
        SeriesGroup {
            acquisition: self.acquisition,
            repetition: self.repetition,
        }
    }

    #[must_use]
    pub fn with_role(&self, role: Role) -> Self {
        self.group().name(role)
    }
}

impl fmt::Display for CanonicalSeriesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.acquisition, self.repetition, self.role)
    }
}

impl FromStr for CanonicalSeriesName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidSeriesName(s.to_string());
        let (acquisition, rest) = split_acquisition(s).ok_or_else(invalid)?;
        let (digits, role) = rest.split_once('_').ok_or_else(invalid)?;
        let repetition: u32 = digits.parse().map_err(|_| invalid())?;
        let role: Role = role.parse().map_err(|_| invalid())?;
        CanonicalSeriesName::new(acquisition, repetition, role).map_err(|_| invalid())
    }
}

impl Serialize for CanonicalSeriesName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalSeriesName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Splits `Dixon_post_contrast_<rest>` / `Dixon_<rest>`, longest prefix first.
fn split_acquisition(s: &str) -> Option<(Acquisition, &str)> {
    [Acquisition::DixonPostContrast, Acquisition::Dixon]
        .into_iter()
        .find_map(|acq| {
            s.strip_prefix(acq.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| (acq, rest))
        })
}

/// DICOM tag values used to classify a series.
///
/// Taken from the first image of the series; absent tags stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTags {
    pub series_number: Option<i32>,
    pub series_description: Option<String>,
    pub sequence_name: Option<String>,
    pub manufacturer: Option<String>,
    /// Echo time in milliseconds.
    pub echo_time: Option<f64>,
    pub image_type: Vec<String>,
}

/// One acquired scan as delivered by the archive export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub site: Site,
    /// Raw patient folder name as exported by the site.
    pub patient_folder: String,
    /// Archive entry name without extension (`series_04`).
    pub entry_name: String,
    pub tags: SeriesTags,
}

impl RawSeries {
    /// Numeric suffix of the archive entry name (`series_1003` → 1003).
    pub fn index(&self) -> Option<u32> {
        trailing_number(&self.entry_name)
    }
}

/// Parses the run of ASCII digits at the end of `value`.
pub fn trailing_number(value: &str) -> Option<u32> {
    let start = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    value[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_canonical_name() {
        let name = CanonicalSeriesName::new(Acquisition::DixonPostContrast, 2, Role::Fat).unwrap();
        assert_eq!(name.to_string(), "Dixon_post_contrast_2_fat");
        assert_eq!(name.group().to_string(), "Dixon_post_contrast_2");
    }

    #[test]
    fn parses_canonical_names() {
        let name: CanonicalSeriesName = "Dixon_1_out_phase".parse().unwrap();
        assert_eq!(name.acquisition, Acquisition::Dixon);
        assert_eq!(name.repetition, 1);
        assert_eq!(name.role, Role::OutPhase);

        let post: CanonicalSeriesName = "Dixon_post_contrast_3_water".parse().unwrap();
        assert_eq!(post.acquisition, Acquisition::DixonPostContrast);
        assert_eq!(post.repetition, 3);

        let other: CanonicalSeriesName = "Dixon_1_T2_MAP".parse().unwrap();
        assert_eq!(other.role, Role::Other("T2_MAP".to_string()));
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["Dixon", "Dixon_x_fat", "Dixon_0_fat", "T1_1_fat", "Dixon_1_"] {
            assert!(bad.parse::<CanonicalSeriesName>().is_err(), "{bad}");
        }
    }

    #[test]
    fn parses_series_group() {
        let group: SeriesGroup = "Dixon_post_contrast_1".parse().unwrap();
        assert_eq!(group, SeriesGroup::first(Acquisition::DixonPostContrast));
        assert_eq!(group.next().repetition, 2);
    }

    #[test]
    fn trailing_number_reads_suffix() {
        assert_eq!(trailing_number("series_04"), Some(4));
        assert_eq!(trailing_number("series_1003"), Some(1003));
        assert_eq!(trailing_number("series"), None);
    }
}
