//! Provenance sidecar stored next to every volume.

use std::path::Path;

use chrono::{DateTime, Utc};
use dixon_model::{CanonicalSeriesName, PatientId, SeriesTags, Site, Study};
use dixon_standards::sha256_hex;
use serde::{Deserialize, Serialize};

use crate::error::{OutputError, Result};

pub const PROVENANCE_FILE: &str = "provenance.json";

/// One source image and its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub sha256: String,
}

impl SourceFile {
    pub fn hash(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| OutputError::io(path, e))?;
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            sha256: sha256_hex(&bytes),
        })
    }
}

/// Where a database entry came from and how it was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub site: Site,
    pub patient: PatientId,
    pub study: Study,
    pub series: CanonicalSeriesName,
    /// Archive entry the images were extracted from (`series_04`).
    pub raw_series: String,
    /// SeriesInstanceUID of the reference series.
    pub reference_uid: String,
    pub tags: SeriesTags,
    pub sources: Vec<SourceFile>,
    /// Fat and water were exchanged by the swap record.
    #[serde(default)]
    pub swapped: bool,
    /// Echo time selected when the entry was split from a two-echo series.
    #[serde(default)]
    pub echo_time: Option<f64>,
    /// Number of slices reconstructed by gap repair.
    #[serde(default)]
    pub interpolated_slices: usize,
    pub written_at: DateTime<Utc>,
}

impl Provenance {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|e| OutputError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| OutputError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_hash_uses_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IM_0001.dcm");
        std::fs::write(&path, b"").unwrap();
        let source = SourceFile::hash(&path).unwrap();
        assert_eq!(source.name, "IM_0001.dcm");
        assert_eq!(
            source.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SourceFile::hash(&dir.path().join("absent.dcm")),
            Err(OutputError::Io { .. })
        ));
    }
}
