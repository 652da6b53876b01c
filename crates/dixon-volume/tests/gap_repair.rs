//! Slice-gap repair on stacks built through the public API.

use std::path::PathBuf;

use dixon_volume::{Slice, SliceGeometry, SliceStack, VolumeError, repair_gap, split_echo_pair};
use ndarray::Array2;
use proptest::prelude::*;

fn geometry() -> SliceGeometry {
    SliceGeometry {
        orientation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        pixel_spacing: [1.0, 1.0],
        rows: 2,
        columns: 2,
    }
}

fn slice(z: f64, value: f32, echo_time: Option<f64>) -> Slice {
    Slice {
        file: Some(PathBuf::from(format!("img_{z}.dcm"))),
        geometry: geometry(),
        position: [0.0, 0.0, z],
        slice_location: Some(z),
        echo_time,
        pixels: Array2::from_elem((2, 2), value),
    }
}

#[test]
fn calibrated_bari_gap_is_reconstructed_for_both_echoes() {
    // Out-phase misses two slices after 11.6357..., in-phase misses one after 13.1357...
    let spacing = 1.5;
    let out_anchor = 11.635_744_288_072_8;
    let in_anchor = 13.135_746_735_542_8;
    let mut slices = Vec::new();
    for k in 0..8 {
        let z = out_anchor - 3.0 * spacing + k as f64 * spacing;
        if z > out_anchor + 0.1 && z < out_anchor + 2.0 * spacing + 0.1 {
            continue;
        }
        slices.push(slice(z, z as f32, Some(2.2)));
    }
    for k in 0..8 {
        let z = in_anchor - 3.0 * spacing + k as f64 * spacing;
        if (z - (in_anchor + spacing)).abs() < 0.1 {
            continue;
        }
        slices.push(slice(z, z as f32, Some(4.6)));
    }

    let mut pair = split_echo_pair(SliceStack::new(slices)).unwrap();
    assert!(matches!(
        pair.out_phase.to_volume(),
        Err(VolumeError::NonUniformSpacing { .. })
    ));
    repair_gap(&mut pair.out_phase, out_anchor, 2).unwrap();
    repair_gap(&mut pair.in_phase, in_anchor, 1).unwrap();

    let out = pair.out_phase.to_volume().unwrap();
    let inp = pair.in_phase.to_volume().unwrap();
    assert_eq!(out.shape(), (2, 2, 8));
    assert_eq!(inp.shape(), (2, 2, 8));
    // Slice values equal their location, so linear interpolation is exact.
    let filled = out.data()[[0, 0, 4]];
    assert!((f64::from(filled) - (out_anchor + spacing)).abs() < 1e-3);
}

#[test]
fn repair_on_a_stack_stored_head_first() {
    // Slice locations decrease along the normal; the gap lies between -5 and -2.
    let mut slices = Vec::new();
    for z in [0.0, 1.0, 2.0, 5.0, 6.0] {
        let mut image = slice(z, z as f32, Some(2.2));
        image.slice_location = Some(-z);
        slices.push(image);
    }
    let mut stack = SliceStack::new(slices);
    repair_gap(&mut stack, -5.0, 2).unwrap();

    let volume = stack.to_volume().unwrap();
    assert_eq!(volume.shape(), (2, 2, 7));
    for k in 0..7 {
        assert!((volume.data()[[0, 0, k]] - k as f32).abs() < 1e-4);
    }
}

proptest! {
    #[test]
    fn repair_keeps_acquired_slices_and_restores_spacing(
        before in 1usize..6,
        after in 1usize..6,
        missing in 1usize..4,
        spacing in 0.5f64..5.0,
    ) {
        let mut slices = Vec::new();
        for k in 0..before {
            let z = k as f64 * spacing;
            slices.push(slice(z, k as f32, None));
        }
        let anchor = (before - 1) as f64 * spacing;
        for k in 0..after {
            let index = before + missing + k;
            let z = index as f64 * spacing;
            slices.push(slice(z, index as f32, None));
        }
        let original = SliceStack::new(slices.clone());
        let mut stack = SliceStack::new(slices);
        repair_gap(&mut stack, anchor, missing).unwrap();

        prop_assert_eq!(stack.len(), before + missing + after);
        let acquired: Vec<&Slice> = stack.slices().iter().filter(|s| s.file.is_some()).collect();
        prop_assert_eq!(acquired.len(), original.len());
        for (kept, orig) in acquired.iter().zip(original.slices()) {
            prop_assert_eq!(*kept, orig);
        }
        let volume = stack.to_volume().unwrap();
        prop_assert!((volume.voxel_size()[2] - spacing).abs() < 1e-6);
        // Values ramp linearly with index, so every interpolated slice matches its index.
        for (index, s) in stack.slices().iter().enumerate() {
            prop_assert!((s.pixels[[0, 0]] - index as f32).abs() < 1e-3);
        }
    }
}
