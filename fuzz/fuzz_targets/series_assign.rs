#![no_main]

use blockrs::{BlockingStrategy, SeriesBlocking, SeriesRecord, SourceDesc};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u8, u8, u8)| {
    let (dx, dy, dz, split) = input;
    let dims = vec![
        (dx as usize % 8) + 1,
        (dy as usize % 8) + 1,
        (dz as usize % 8) + 1,
    ];

    // walk the monotonic configurations: unsplit, one partial axis, the
    // rest fully split
    let candidates = [
        vec![1, 1, (split as usize % dims[2]) + 1],
        vec![1, (split as usize % dims[1]) + 1, dims[2]],
        vec![(split as usize % dims[0]) + 1, dims[1], dims[2]],
    ];

    for splits in candidates {
        let source: SourceDesc<f64> = SourceDesc::new(dims.clone(), 2);
        let strategy = SeriesBlocking::new(splits)
            .unwrap()
            .bind(&source)
            .unwrap();

        // every voxel maps to exactly one block that contains it
        let mut per_block = vec![0usize; strategy.nblocks()];
        for x in 0..dims[0] {
            for y in 0..dims[1] {
                for z in 0..dims[2] {
                    let record = SeriesRecord::new(vec![x, y, z], vec![0.0, 0.0]);
                    let assigned = strategy.blocking_function(record).unwrap();
                    assert_eq!(assigned.len(), 1);
                    let (block, rec) = &assigned[0];
                    let coord = strategy.block_coordinate(*block).unwrap();
                    for (c, range) in rec.coord.iter().zip(coord.ranges()) {
                        assert!(range.contains(*c));
                    }
                    per_block[*block] += 1;
                }
            }
        }

        // all blocks together cover the volume exactly
        let total: usize = dims.iter().product();
        assert_eq!(per_block.iter().sum::<usize>(), total);
        assert!(per_block.iter().all(|&n| n > 0));
    }
});
