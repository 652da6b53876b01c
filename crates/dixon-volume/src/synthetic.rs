//! JSON stand-in for DICOM image files.
//!
//! Each file holds one [`SyntheticImage`]. Archives of such files exercise
//! the whole pipeline without real scanner data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dixon_model::SeriesTags;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumeError};
use crate::source::{DicomSource, SeriesFiles, folder_files};
use crate::stack::{Slice, SliceGeometry, SliceStack};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticImage {
    pub series_uid: String,
    pub tags: SeriesTags,
    pub orientation: [f64; 6],
    pub pixel_spacing: [f64; 2],
    pub position: [f64; 3],
    #[serde(default)]
    pub slice_location: Option<f64>,
    pub rows: usize,
    pub columns: usize,
    /// Row-major pixel values.
    pub pixels: Vec<f32>,
}

impl SyntheticImage {
    /// An axial `rows x columns` image at height `z` filled with `value`.
    pub fn axial(
        series_uid: &str,
        tags: SeriesTags,
        z: f64,
        rows: usize,
        columns: usize,
        value: f32,
    ) -> Self {
        Self {
            series_uid: series_uid.to_string(),
            tags,
            orientation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            pixel_spacing: [1.0, 1.0],
            position: [0.0, 0.0, z],
            slice_location: Some(z),
            rows,
            columns,
            pixels: vec![value; rows * columns],
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes()?)
    }
}

/// [`DicomSource`] reading [`SyntheticImage`] files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    fn load(file: &Path) -> Result<SyntheticImage> {
        let bytes = std::fs::read(file).map_err(|e| VolumeError::Dicom {
            file: file.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| VolumeError::Dicom {
            file: file.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl DicomSource for SyntheticSource {
    fn read_tags(&self, file: &Path) -> Result<SeriesTags> {
        Ok(Self::load(file)?.tags)
    }

    fn group_into_series(&self, folder: &Path) -> Result<Vec<SeriesFiles>> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in folder_files(folder)? {
            let image = Self::load(&file)?;
            groups.entry(image.series_uid).or_default().push(file);
        }
        Ok(groups
            .into_iter()
            .map(|(uid, files)| SeriesFiles { uid, files })
            .collect())
    }

    fn read_slices(&self, series: &SeriesFiles) -> Result<SliceStack> {
        let mut slices = Vec::new();
        for file in &series.files {
            let image = Self::load(file)?;
            let pixels = Array2::from_shape_vec((image.rows, image.columns), image.pixels)
                .map_err(|e| VolumeError::InconsistentGeometry(e.to_string()))?;
            slices.push(Slice {
                file: Some(file.clone()),
                geometry: SliceGeometry {
                    orientation: image.orientation,
                    pixel_spacing: image.pixel_spacing,
                    rows: image.rows,
                    columns: image.columns,
                },
                position: image.position,
                slice_location: image.slice_location,
                echo_time: image.tags.echo_time,
                pixels,
            });
        }
        if slices.is_empty() {
            return Err(VolumeError::EmptySeries);
        }
        Ok(SliceStack::new(slices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_image_reads_back_as_one_slice() {
        let dir = tempfile::tempdir().unwrap();
        let tags = SeriesTags {
            echo_time: Some(2.3),
            ..SeriesTags::default()
        };
        let image = SyntheticImage::axial("1.2.3", tags, 4.0, 2, 3, 7.5);
        let path = dir.path().join("IM_0001");
        image.write(&path).unwrap();

        assert_eq!(SyntheticSource::load(&path).unwrap(), image);
        let series = SeriesFiles {
            uid: "1.2.3".to_string(),
            files: vec![path],
        };
        let stack = SyntheticSource.read_slices(&series).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.slices()[0].echo_time, Some(2.3));
        assert_eq!(stack.slices()[0].pixels.dim(), (2, 3));
    }
}
