//! The image-series collaborator.
//!
//! Everything the pipeline needs from DICOM files goes through
//! [`DicomSource`], so the orchestrator can be driven by the real decoder
//! or by a synthetic stand-in.

use std::path::{Path, PathBuf};

use dixon_model::SeriesTags;

use crate::error::{Result, VolumeError};
use crate::stack::SliceStack;
use crate::volume::Volume;

/// The files of one series found in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesFiles {
    /// SeriesInstanceUID, or a synthetic key for regrouped images.
    pub uid: String,
    pub files: Vec<PathBuf>,
}

impl SeriesFiles {
    pub fn first_file(&self) -> Result<&Path> {
        self.files
            .first()
            .map(PathBuf::as_path)
            .ok_or(VolumeError::EmptySeries)
    }
}

pub trait DicomSource {
    /// Classification tags of one image file.
    fn read_tags(&self, file: &Path) -> Result<SeriesTags>;

    /// Groups the image files directly inside `folder` by series.
    ///
    /// Series come back sorted by UID; files within a series by name.
    fn group_into_series(&self, folder: &Path) -> Result<Vec<SeriesFiles>>;

    /// Decodes every image of a series, ordered along the slice normal.
    fn read_slices(&self, series: &SeriesFiles) -> Result<SliceStack>;

    /// Reads a series as one volume.
    fn read_volume(&self, series: &SeriesFiles) -> Result<Volume> {
        self.read_slices(series)?.to_volume()
    }

    /// Tags of the first image, which stand for the whole series.
    fn series_tags(&self, series: &SeriesFiles) -> Result<SeriesTags> {
        self.read_tags(series.first_file()?)
    }
}

/// Lists regular files directly inside `folder`, sorted.
pub(crate) fn folder_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let io = |source| VolumeError::Io {
        path: folder.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
