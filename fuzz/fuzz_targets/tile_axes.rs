#![no_main]

use blockrs::slices::{AxisRange, slices_from_pixels, slices_from_splits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let (raw_dims, raw_units) = input;

    // keep the search space small but nontrivial
    let dims: Vec<usize> = raw_dims.iter().take(4).map(|&d| (d as usize % 64) + 1).collect();
    let units: Vec<usize> = raw_units.iter().take(4).map(|&u| (u as usize % 64) + 1).collect();
    if dims.is_empty() || units.len() != dims.len() {
        return;
    }

    // split mode: either a clean tiling or a structured error
    match slices_from_splits(&units, &dims) {
        Ok(slices) => {
            for (axis_slices, &extent) in slices.iter().zip(&dims) {
                // contiguous, non-overlapping, exact cover
                let mut cursor = 0;
                for range in axis_slices {
                    assert_eq!(range.start, cursor);
                    assert!(range.stop > range.start);
                    cursor = range.stop;
                }
                assert_eq!(cursor, extent);

                // lengths differ by at most one
                let min = axis_slices.iter().map(AxisRange::len).min().unwrap();
                let max = axis_slices.iter().map(AxisRange::len).max().unwrap();
                assert!(max - min <= 1);
            }
        }
        Err(_) => {
            // a rejected split must genuinely exceed some axis
            assert!(units.iter().zip(&dims).any(|(u, d)| u > d));
        }
    }

    // pixel mode always tiles: every range full-length except the last
    let slices = slices_from_pixels(&units, &dims).unwrap();
    for ((axis_slices, &extent), &pix) in slices.iter().zip(&dims).zip(&units) {
        let mut cursor = 0;
        for (i, range) in axis_slices.iter().enumerate() {
            assert_eq!(range.start, cursor);
            if i < axis_slices.len() - 1 {
                assert_eq!(range.len(), pix);
            } else {
                assert!(range.len() <= pix);
            }
            cursor = range.stop;
        }
        assert_eq!(cursor, extent);
    }
});
