//! [`DicomSource`] backed by the `dicom` crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::{DefaultDicomObject, OpenFileOptions, open_file};
use dicom::pixeldata::PixelDecoder;
use dixon_model::SeriesTags;
use ndarray::Array2;

use crate::error::{Result, VolumeError};
use crate::source::{DicomSource, SeriesFiles, folder_files};
use crate::stack::{Slice, SliceGeometry, SliceStack};

/// Reads DICOM part-10 files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFileSource;

impl DicomFileSource {
    pub fn new() -> Self {
        Self
    }

    fn open(file: &Path) -> Result<DefaultDicomObject> {
        open_file(file).map_err(|e| dicom_error(file, e))
    }

    /// Opens `file` without reading its pixel data.
    fn open_header(file: &Path) -> Result<DefaultDicomObject> {
        OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(file)
            .map_err(|e| dicom_error(file, e))
    }
}

fn dicom_error(file: &Path, error: impl ToString) -> VolumeError {
    VolumeError::Dicom {
        file: file.to_path_buf(),
        message: error.to_string(),
    }
}

fn text(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
    let value = obj.element(tag).ok()?.to_str().ok()?;
    let trimmed = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn float(obj: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    obj.element(tag).ok()?.to_float64().ok()
}

fn floats(obj: &DefaultDicomObject, tag: Tag) -> Option<Vec<f64>> {
    obj.element(tag).ok()?.to_multi_float64().ok()
}

fn tags_of(obj: &DefaultDicomObject) -> SeriesTags {
    SeriesTags {
        series_number: obj
            .element(tags::SERIES_NUMBER)
            .ok()
            .and_then(|e| e.to_int::<i32>().ok()),
        series_description: text(obj, tags::SERIES_DESCRIPTION),
        sequence_name: text(obj, tags::SEQUENCE_NAME),
        manufacturer: text(obj, tags::MANUFACTURER),
        echo_time: float(obj, tags::ECHO_TIME),
        image_type: obj
            .element(tags::IMAGE_TYPE)
            .ok()
            .and_then(|e| e.to_multi_str().ok())
            .map(|values| values.iter().map(|v| v.trim().to_string()).collect())
            .unwrap_or_default(),
    }
}

fn required<T>(value: Option<T>, file: &Path, attribute: &'static str) -> Result<T> {
    value.ok_or_else(|| VolumeError::MissingAttribute {
        file: file.to_path_buf(),
        attribute,
    })
}

fn read_slice(file: &Path, obj: &DefaultDicomObject) -> Result<Slice> {
    let orientation = required(
        floats(obj, tags::IMAGE_ORIENTATION_PATIENT),
        file,
        "ImageOrientationPatient",
    )?;
    let position = required(
        floats(obj, tags::IMAGE_POSITION_PATIENT),
        file,
        "ImagePositionPatient",
    )?;
    let spacing = required(floats(obj, tags::PIXEL_SPACING), file, "PixelSpacing")?;
    let (Ok(orientation), Ok(position), Ok(pixel_spacing)) = (
        <[f64; 6]>::try_from(orientation),
        <[f64; 3]>::try_from(position),
        <[f64; 2]>::try_from(spacing),
    ) else {
        return Err(VolumeError::InconsistentGeometry(format!(
            "malformed geometry attributes in {}",
            file.display()
        )));
    };

    let decoded = obj.decode_pixel_data().map_err(|e| dicom_error(file, e))?;
    let rows = decoded.rows() as usize;
    let columns = decoded.columns() as usize;
    let values: Vec<f32> = decoded.to_vec::<f32>().map_err(|e| dicom_error(file, e))?;
    // Multi-frame objects: only the first frame is used.
    let frame: Vec<f32> = values.into_iter().take(rows * columns).collect();
    let pixels =
        Array2::from_shape_vec((rows, columns), frame).map_err(|e| dicom_error(file, e))?;

    Ok(Slice {
        file: Some(file.to_path_buf()),
        geometry: SliceGeometry {
            orientation,
            pixel_spacing,
            rows,
            columns,
        },
        position,
        slice_location: float(obj, tags::SLICE_LOCATION),
        echo_time: float(obj, tags::ECHO_TIME),
        pixels,
    })
}

impl DicomSource for DicomFileSource {
    fn read_tags(&self, file: &Path) -> Result<SeriesTags> {
        Ok(tags_of(&Self::open_header(file)?))
    }

    fn group_into_series(&self, folder: &Path) -> Result<Vec<SeriesFiles>> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in folder_files(folder)? {
            // Non-DICOM files in an export (manifests, thumbnails) are skipped.
            let obj = match Self::open_header(&file) {
                Ok(obj) => obj,
                Err(e) => {
                    tracing::debug!(file = %file.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let uid = text(&obj, tags::SERIES_INSTANCE_UID).unwrap_or_default();
            groups.entry(uid).or_default().push(file);
        }
        Ok(groups
            .into_iter()
            .map(|(uid, files)| SeriesFiles { uid, files })
            .collect())
    }

    fn read_slices(&self, series: &SeriesFiles) -> Result<SliceStack> {
        let mut slices = Vec::with_capacity(series.files.len());
        for file in &series.files {
            let obj = Self::open(file)?;
            slices.push(read_slice(file, &obj)?);
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
    fn non_dicom_files_are_skipped_when_grouping() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("manifest.txt"), b"not dicom").unwrap();
        let series = DicomFileSource::new().group_into_series(dir.path()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn unreadable_file_is_dicom_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.dcm");
        std::fs::write(&file, b"garbage").unwrap();
        assert!(matches!(
            DicomFileSource::new().read_tags(&file),
            Err(VolumeError::Dicom { .. })
        ));
    }
}
