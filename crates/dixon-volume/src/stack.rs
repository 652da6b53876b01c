//! Slice stacks: the 2-D images of one series with their positions.

use std::path::PathBuf;

use ndarray::{Array2, Array3, s};

use crate::error::{Result, VolumeError};
use crate::volume::Volume;

/// Relative tolerance for slice-spacing uniformity.
const SPACING_TOLERANCE: f64 = 0.01;
/// Absolute tolerance (mm) below which two locations are the same.
pub(crate) const LOCATION_EPSILON: f64 = 1e-3;

/// In-plane geometry shared by all slices of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGeometry {
    /// ImageOrientationPatient: row cosines then column cosines.
    pub orientation: [f64; 6],
    /// PixelSpacing: (row spacing, column spacing) in mm.
    pub pixel_spacing: [f64; 2],
    pub rows: usize,
    pub columns: usize,
}

impl SliceGeometry {
    pub fn row_direction(&self) -> [f64; 3] {
        [self.orientation[0], self.orientation[1], self.orientation[2]]
    }

    pub fn column_direction(&self) -> [f64; 3] {
        [self.orientation[3], self.orientation[4], self.orientation[5]]
    }

    /// Unit normal of the slice plane.
    pub fn normal(&self) -> [f64; 3] {
        let r = self.row_direction();
        let c = self.column_direction();
        [
            r[1] * c[2] - r[2] * c[1],
            r[2] * c[0] - r[0] * c[2],
            r[0] * c[1] - r[1] * c[0],
        ]
    }

    fn matches(&self, other: &SliceGeometry) -> bool {
        self.rows == other.rows
            && self.columns == other.columns
            && self
                .orientation
                .iter()
                .zip(other.orientation)
                .all(|(a, b)| (a - b).abs() < 1e-4)
            && self
                .pixel_spacing
                .iter()
                .zip(other.pixel_spacing)
                .all(|(a, b)| (a - b).abs() < 1e-4)
    }
}

/// One image with the attributes needed to place it in a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Source file; `None` for interpolated slices.
    pub file: Option<PathBuf>,
    pub geometry: SliceGeometry,
    /// ImagePositionPatient of the first voxel.
    pub position: [f64; 3],
    /// SliceLocation as stored by the scanner, if any.
    pub slice_location: Option<f64>,
    pub echo_time: Option<f64>,
    /// Pixel values, shape `(rows, columns)`, rescale applied.
    pub pixels: Array2<f32>,
}

impl Slice {
    /// Position along the slice normal.
    pub fn distance(&self) -> f64 {
        let n = self.geometry.normal();
        n.iter().zip(self.position).map(|(a, b)| a * b).sum()
    }

    /// The scanner's SliceLocation, falling back to the distance along the normal.
    pub fn location(&self) -> f64 {
        self.slice_location.unwrap_or_else(|| self.distance())
    }
}

/// The slices of one series, ordered along the slice normal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SliceStack {
    slices: Vec<Slice>,
}

impl SliceStack {
    pub fn new(mut slices: Vec<Slice>) -> Self {
        slices.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
        Self { slices }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub(crate) fn slices_mut(&mut self) -> &mut Vec<Slice> {
        &mut self.slices
    }

    pub fn into_slices(self) -> Vec<Slice> {
        self.slices
    }

    /// Source files of every non-interpolated slice.
    pub fn files(&self) -> Vec<PathBuf> {
        self.slices.iter().filter_map(|s| s.file.clone()).collect()
    }

    /// Assembles the stack into a volume.
    ///
    /// Requires identical in-plane geometry, distinct positions and uniform
    /// spacing along the normal.
    pub fn to_volume(&self) -> Result<Volume> {
        let first = self.slices.first().ok_or(VolumeError::EmptySeries)?;
        let geometry = first.geometry;
        if let Some(odd) = self.slices.iter().find(|s| !s.geometry.matches(&geometry)) {
            return Err(VolumeError::InconsistentGeometry(format!(
                "{}x{} slice in a {}x{} series",
                odd.geometry.rows, odd.geometry.columns, geometry.rows, geometry.columns
            )));
        }
        if let Some(odd) = self
            .slices
            .iter()
            .find(|s| s.pixels.dim() != (geometry.rows, geometry.columns))
        {
            return Err(VolumeError::InconsistentGeometry(format!(
                "pixel array {:?} does not match {}x{}",
                odd.pixels.dim(),
                geometry.rows,
                geometry.columns
            )));
        }

        let spacing = self.slice_spacing()?;
        let mut data = Array3::<f32>::zeros((geometry.columns, geometry.rows, self.slices.len()));
        for (k, slice) in self.slices.iter().enumerate() {
            data.slice_mut(s![.., .., k]).assign(&slice.pixels.t());
        }
        Ok(Volume::from_geometry(data, &geometry, first.position, spacing))
    }

    /// Distance between consecutive slices; 1 mm for single-slice stacks.
    fn slice_spacing(&self) -> Result<f64> {
        let distances: Vec<f64> = self.slices.iter().map(Slice::distance).collect();
        let steps: Vec<f64> = distances.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(idx) = steps.iter().position(|step| step.abs() < LOCATION_EPSILON) {
            return Err(VolumeError::DuplicateSlice {
                location: self.slices[idx].location(),
            });
        }
        if steps.is_empty() {
            return Ok(1.0);
        }
        let expected = (distances[distances.len() - 1] - distances[0]) / steps.len() as f64;
        for (index, step) in steps.iter().enumerate() {
            if (step - expected).abs() > expected.abs() * SPACING_TOLERANCE {
                return Err(VolumeError::NonUniformSpacing {
                    expected,
                    found: *step,
                    index,
                });
            }
        }
        Ok(expected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn axial_geometry(rows: usize, columns: usize) -> SliceGeometry {
        SliceGeometry {
            orientation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            pixel_spacing: [1.5, 1.25],
            rows,
            columns,
        }
    }

    pub(crate) fn slice_at(z: f64, value: f32, echo_time: Option<f64>) -> Slice {
        let geometry = axial_geometry(2, 3);
        Slice {
            file: Some(PathBuf::from(format!("{z}.dcm"))),
            geometry,
            position: [-10.0, 20.0, z],
            slice_location: Some(z),
            echo_time,
            pixels: Array2::from_elem((2, 3), value),
        }
    }

    #[test]
    fn sorts_and_assembles() {
        let stack = SliceStack::new(vec![
            slice_at(3.0, 3.0, None),
            slice_at(0.0, 0.0, None),
            slice_at(1.5, 1.5, None),
        ]);
        let volume = stack.to_volume().unwrap();
        assert_eq!(volume.shape(), (3, 2, 3));
        assert_eq!(volume.data()[[0, 0, 2]], 3.0);
        let affine = volume.affine();
        assert_eq!(affine[0][0], 1.25);
        assert_eq!(affine[1][1], 1.5);
        assert_eq!(affine[2][2], 1.5);
        assert_eq!(affine[2][3], 0.0);
    }

    #[test]
    fn rejects_gaps_and_duplicates() {
        let gap = SliceStack::new(vec![
            slice_at(0.0, 0.0, None),
            slice_at(1.0, 0.0, None),
            slice_at(3.0, 0.0, None),
        ]);
        assert!(matches!(
            gap.to_volume(),
            Err(VolumeError::NonUniformSpacing { .. })
        ));
        let duplicate = SliceStack::new(vec![slice_at(0.0, 0.0, None), slice_at(0.0, 1.0, None)]);
        assert!(matches!(
            duplicate.to_volume(),
            Err(VolumeError::DuplicateSlice { .. })
        ));
        assert!(matches!(
            SliceStack::default().to_volume(),
            Err(VolumeError::EmptySeries)
        ));
    }
}
