use ndarray::Array3;

use crate::stack::SliceGeometry;

/// A 3-D image with its voxel-to-patient transform.
///
/// `data` is indexed `[column, row, slice]`. The affine maps voxel indices
/// to DICOM patient coordinates (LPS, millimetres).
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f32>,
    affine: [[f64; 4]; 4],
}

impl Volume {
    pub fn new(data: Array3<f32>, affine: [[f64; 4]; 4]) -> Self {
        Self { data, affine }
    }

    pub(crate) fn from_geometry(
        data: Array3<f32>,
        geometry: &SliceGeometry,
        origin: [f64; 3],
        slice_spacing: f64,
    ) -> Self {
        let r = geometry.row_direction();
        let c = geometry.column_direction();
        let n = geometry.normal();
        let [row_spacing, column_spacing] = geometry.pixel_spacing;
        let mut affine = [[0.0; 4]; 4];
        for axis in 0..3 {
            affine[axis][0] = r[axis] * column_spacing;
            affine[axis][1] = c[axis] * row_spacing;
            affine[axis][2] = n[axis] * slice_spacing;
            affine[axis][3] = origin[axis];
        }
        affine[3][3] = 1.0;
        Self { data, affine }
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    pub fn affine(&self) -> [[f64; 4]; 4] {
        self.affine
    }

    /// `(columns, rows, slices)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Voxel size along each array axis, in mm.
    pub fn voxel_size(&self) -> [f64; 3] {
        let mut size = [0.0; 3];
        for (axis, value) in size.iter_mut().enumerate() {
            *value = (0..3)
                .map(|row| self.affine[row][axis].powi(2))
                .sum::<f64>()
                .sqrt();
        }
        size
    }

    /// The affine in NIfTI (RAS) convention.
    pub fn ras_affine(&self) -> [[f64; 4]; 4] {
        let mut ras = self.affine;
        for row in ras.iter_mut().take(2) {
            for value in row.iter_mut() {
                *value = -*value;
            }
        }
        ras
    }
}
