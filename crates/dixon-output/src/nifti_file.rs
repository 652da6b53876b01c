//! NIfTI-1 encoding of harmonized volumes.

use std::path::Path;

use dixon_volume::Volume;
use nifti::NiftiHeader;
use nifti::writer::WriterOptions;

use crate::error::{OutputError, Result};

/// NIfTI `xyzt_units` value for millimetres.
const UNITS_MM: u8 = 2;
/// sform/qform code for scanner-based coordinates.
const SCANNER_ANAT: i16 = 1;

/// Header carrying the volume's affine as sform and its voxel size as pixdim.
pub fn volume_header(volume: &Volume) -> NiftiHeader {
    let ras = volume.ras_affine();
    let voxel = volume.voxel_size();
    NiftiHeader {
        pixdim: [1.0, voxel[0] as f32, voxel[1] as f32, voxel[2] as f32, 0.0, 0.0, 0.0, 0.0],
        xyzt_units: UNITS_MM,
        sform_code: SCANNER_ANAT,
        qform_code: 0,
        srow_x: row(&ras[0]),
        srow_y: row(&ras[1]),
        srow_z: row(&ras[2]),
        ..NiftiHeader::default()
    }
}

fn row(values: &[f64; 4]) -> [f32; 4] {
    values.map(|v| v as f32)
}

/// Writes `volume` as float32 NIfTI. A `.gz` extension selects gzip.
pub fn write_volume(volume: &Volume, path: &Path) -> Result<()> {
    let header = volume_header(volume);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(volume.data())
        .map_err(|e| OutputError::Nifti {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
