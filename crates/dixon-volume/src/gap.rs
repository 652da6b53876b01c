//! Reconstruction of known interior slice gaps.

use crate::error::{Result, VolumeError};
use crate::stack::{LOCATION_EPSILON, Slice, SliceStack};

/// Inserts `missing` linearly interpolated slices after the slice at
/// `after_location`, "after" meaning the next slice in ascending
/// SliceLocation. The stack itself stays ordered along the slice normal,
/// which may run either way relative to SliceLocation.
///
/// The k-th inserted slice (1-based) weighs the slice before the gap by
/// `1 - k/(missing+1)` and the slice after it by `k/(missing+1)`: one
/// missing slice becomes the mean of its neighbours, two become
/// `(2/3, 1/3)` then `(1/3, 2/3)`. Positions are interpolated the same way.
pub fn repair_gap(stack: &mut SliceStack, after_location: f64, missing: usize) -> Result<()> {
    if missing == 0 {
        return Ok(());
    }
    let slices = stack.slices_mut();
    let not_found = || VolumeError::GapAnchorNotFound {
        location: after_location,
    };
    let anchor = slices
        .iter()
        .position(|s| (s.location() - after_location).abs() < LOCATION_EPSILON)
        .ok_or_else(not_found)?;

    let ascends = |idx: usize| {
        slices
            .get(idx)
            .is_some_and(|s| s.location() > slices[anchor].location() + LOCATION_EPSILON)
    };
    // (neighbour in ascending SliceLocation, insertion index in the stack)
    let (next, insert_at) = if ascends(anchor + 1) {
        (anchor + 1, anchor + 1)
    } else if anchor > 0 && ascends(anchor - 1) {
        (anchor - 1, anchor)
    } else {
        return Err(not_found());
    };

    let steps = (missing + 1) as f64;
    let mut inserted: Vec<Slice> = (1..=missing)
        .map(|k| interpolate(&slices[anchor], &slices[next], k as f64 / steps))
        .collect();
    if next < anchor {
        inserted.reverse();
    }

    tracing::debug!(after_location, missing, "interpolated missing slices");
    slices.splice(insert_at..insert_at, inserted);
    Ok(())
}

/// `(1 - w) * before + w * after`.
fn interpolate(before: &Slice, after: &Slice, w: f64) -> Slice {
    let wf = w as f32;
    let pixels = &before.pixels * (1.0 - wf) + &after.pixels * wf;
    let mut position = [0.0; 3];
    for (axis, value) in position.iter_mut().enumerate() {
        *value = (1.0 - w) * before.position[axis] + w * after.position[axis];
    }
    let slice_location = match (before.slice_location, after.slice_location) {
        (Some(a), Some(b)) => Some((1.0 - w) * a + w * b),
        _ => None,
    };
    Slice {
        file: None,
        geometry: before.geometry,
        position,
        slice_location,
        echo_time: before.echo_time,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::tests::slice_at;

    #[test]
    fn single_slice_gap_is_neighbour_mean() {
        let mut stack = SliceStack::new(vec![
            slice_at(0.0, 2.0, None),
            slice_at(1.0, 4.0, None),
            slice_at(3.0, 10.0, None),
        ]);
        repair_gap(&mut stack, 1.0, 1).unwrap();
        assert_eq!(stack.len(), 4);
        let inserted = &stack.slices()[2];
        assert!(inserted.file.is_none());
        assert!(inserted.pixels.iter().all(|v| (*v - 7.0).abs() < 1e-6));
        assert_eq!(inserted.position[2], 2.0);
        assert!(stack.to_volume().is_ok());
    }

    #[test]
    fn two_slice_gap_weights() {
        let mut stack = SliceStack::new(vec![
            slice_at(0.0, 0.0, None),
            slice_at(3.0, 3.0, None),
            slice_at(4.0, 4.0, None),
        ]);
        // Spacing 1 mm, slices 1 and 2 are missing.
        repair_gap(&mut stack, 0.0, 2).unwrap();
        let values: Vec<f32> = stack.slices().iter().map(|s| s.pixels[[0, 0]]).collect();
        assert_eq!(values.len(), 5);
        assert!((values[1] - 1.0).abs() < 1e-6);
        assert!((values[2] - 2.0).abs() < 1e-6);
        assert!(stack.to_volume().is_ok());
    }

    #[test]
    fn gap_follows_ascending_slice_location() {
        // SliceLocation runs against the normal: z = 4, 3, 1, 0 at -4, -3, -1, 0.
        let slices: Vec<Slice> = [4.0, 3.0, 1.0, 0.0]
            .into_iter()
            .map(|z| {
                let mut slice = slice_at(z, z as f32, None);
                slice.slice_location = Some(-z);
                slice
            })
            .collect();
        let mut stack = SliceStack::new(slices);
        repair_gap(&mut stack, -3.0, 1).unwrap();

        let locations: Vec<f64> = stack.slices().iter().map(Slice::location).collect();
        assert_eq!(locations, vec![0.0, -1.0, -2.0, -3.0, -4.0]);
        assert!((stack.slices()[2].pixels[[0, 0]] - 2.0).abs() < 1e-6);
        assert_eq!(stack.slices()[2].position[2], 2.0);
        assert!(stack.to_volume().is_ok());
    }

    #[test]
    fn unknown_anchor_is_error() {
        let mut stack = SliceStack::new(vec![slice_at(0.0, 0.0, None), slice_at(1.0, 1.0, None)]);
        assert!(matches!(
            repair_gap(&mut stack, 5.0, 1),
            Err(VolumeError::GapAnchorNotFound { .. })
        ));
        // The last slice cannot anchor a gap.
        assert!(matches!(
            repair_gap(&mut stack, 1.0, 1),
            Err(VolumeError::GapAnchorNotFound { .. })
        ));
    }
}
