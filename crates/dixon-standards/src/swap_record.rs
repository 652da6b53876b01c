//! Manually curated fat-water swap record.
//!
//! The record is a CSV with header `Site,Patient,Study,Series,Swapped`, one
//! row per reviewed series group. `Swapped` is `0` or `1`.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use dixon_model::{PatientId, SeriesGroup, Site, Study};

use crate::error::StandardsError;

/// Column order of the swap record file.
pub const SWAP_RECORD_HEADER: [&str; 5] = ["Site", "Patient", "Study", "Series", "Swapped"];

/// Identifies one series group of one patient visit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwapKey {
    pub site: Site,
    pub patient: PatientId,
    pub study: Study,
    pub group: SeriesGroup,
}

impl std::fmt::Display for SwapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.site, self.patient, self.study, self.group
        )
    }
}

/// Read-only lookup of reviewed series groups.
#[derive(Debug, Clone, Default)]
pub struct FatWaterSwapRecord {
    rows: BTreeMap<SwapKey, bool>,
}

impl FatWaterSwapRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a record file.
    pub fn load(path: &Path) -> Result<Self, StandardsError> {
        let bytes = std::fs::read(path).map_err(|e| StandardsError::io(path, e))?;
        let record = Self::parse(&bytes, path)?;
        tracing::debug!(
            path = %path.display(),
            rows = record.len(),
            swapped = record.swapped_count(),
            "loaded fat-water swap record"
        );
        Ok(record)
    }

    /// Parses record bytes; `path` is only used in error messages.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self, StandardsError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);
        let csv_error = |e: csv::Error| StandardsError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &str| -> Result<usize, StandardsError> {
            headers
                .iter()
                .position(|h| h.trim_matches('\u{feff}') == name)
                .ok_or_else(|| StandardsError::Csv {
                    path: path.to_path_buf(),
                    message: format!("missing column {name}"),
                })
        };
        let [site_col, patient_col, study_col, series_col, swapped_col] =
            [0, 1, 2, 3, 4].map(|i| column(SWAP_RECORD_HEADER[i]));
        let (site_col, patient_col, study_col, series_col, swapped_col) =
            (site_col?, patient_col?, study_col?, series_col?, swapped_col?);

        let mut record = Self::new();
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let line = row.position().map_or(0, csv::Position::line);
            let field = |idx: usize| row.get(idx).unwrap_or("");
            let invalid = |source| StandardsError::InvalidRow {
                path: path.to_path_buf(),
                line,
                source,
            };

            let key = SwapKey {
                site: field(site_col).parse().map_err(invalid)?,
                patient: PatientId::new(field(patient_col)).map_err(invalid)?,
                study: field(study_col).parse().map_err(invalid)?,
                group: field(series_col).parse().map_err(invalid)?,
            };
            let swapped = match field(swapped_col) {
                "0" => false,
                "1" => true,
                other => {
                    return Err(StandardsError::InvalidSwapFlag {
                        path: path.to_path_buf(),
                        line,
                        value: other.to_string(),
                    });
                }
            };
            if record.rows.contains_key(&key) {
                return Err(StandardsError::DuplicateSwapRow {
                    path: path.to_path_buf(),
                    line,
                    key: key.to_string(),
                });
            }
            record.rows.insert(key, swapped);
        }
        Ok(record)
    }

    pub fn insert(&mut self, key: SwapKey, swapped: bool) {
        self.rows.insert(key, swapped);
    }

    /// Reviewed state of a series group, `None` when it was never reviewed.
    pub fn lookup(&self, key: &SwapKey) -> Option<bool> {
        self.rows.get(key).copied()
    }

    pub fn is_swapped(&self, key: &SwapKey) -> bool {
        self.lookup(key).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn swapped_count(&self) -> usize {
        self.rows.values().filter(|swapped| **swapped).count()
    }
}
