//! Inverse blocking demo: scatter a volume into per-voxel series records,
//! then rebuild spatially-contiguous blocks from them.
//!
//! Run with:
//!     cargo run --example series_rebuild

use std::collections::HashMap;

use blockrs::{BlockingStrategy, SeriesBlocking, SeriesRecord, SourceDesc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // an 8x8x4 volume with 6 values per voxel, split along z
    let dims = vec![8usize, 8, 4];
    let nrecords = 6;
    let source: SourceDesc<f64> = SourceDesc::new(dims.clone(), nrecords);
    let strategy = SeriesBlocking::new(vec![1, 1, 4])?.bind(&source)?;
    println!(
        "rebuilding {:?} x {} values into {} blocks",
        strategy.dims(),
        strategy.nrecords(),
        strategy.nblocks(),
    );

    // scatter: every voxel becomes one keyed record
    let mut grouped: HashMap<usize, Vec<SeriesRecord<f64>>> = HashMap::new();
    for x in 0..dims[0] {
        for y in 0..dims[1] {
            for z in 0..dims[2] {
                let base = (x + 10 * y + 100 * z) as f64;
                let values = (0..nrecords).map(|t| base + 1000.0 * t as f64).collect();
                let record = SeriesRecord::new(vec![x, y, z], values);
                for (block, rec) in strategy.blocking_function(record)? {
                    grouped.entry(block).or_default().push(rec);
                }
            }
        }
    }

    // rebuild each block from its collected voxels
    let mut blocks: Vec<_> = grouped.into_iter().collect();
    blocks.sort_by_key(|(block, _)| *block);
    for (block, items) in blocks {
        let nvoxels = items.len();
        let combined = strategy.combining_function(&block, items)?;
        println!(
            "  block {} <- {} voxels, shape {:?} at {}",
            block,
            nvoxels,
            combined.data.shape(),
            combined.key.coordinate(),
        );
    }

    Ok(())
}
