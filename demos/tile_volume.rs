//! Forward tiling demo: cut a volume stack into blocks by byte budget,
//! then reassemble each spatial position across time.
//!
//! Run with:
//!     cargo run --example tile_volume

use std::collections::HashMap;

use blockrs::{
    Block, BlockCoordinate, BlockError, BlockingStrategy, ImageStack, SimpleBlocking,
    util::parse_memory_string,
};
use ndarray::{ArrayD, IxDyn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // a 16x16x8 volume observed over 5 time points
    let dims = [16usize, 16, 8];
    let total: usize = dims.iter().product();
    let records: Vec<ArrayD<f32>> = (0..5)
        .map(|t| {
            ArrayD::from_shape_vec(
                IxDyn(&dims),
                (0..total).map(|i| (i + 1000 * t) as f32).collect(),
            )
        })
        .collect::<Result<_, _>>()?;
    let stack = ImageStack::new(records)?;

    // ask for roughly 2 KiB per block
    let budget = parse_memory_string("2k")? as f64;
    let strategy = SimpleBlocking::from_block_size(&stack, budget)?;
    println!(
        "tiling {:?} x {} records into {} blocks (avg {:.0} bytes each)",
        strategy.dims(),
        strategy.nrecords(),
        strategy.block_count(),
        strategy.calc_average_block_size(),
    );

    // block every record, grouping outputs by spatial position
    let mut grouped: HashMap<BlockCoordinate, Vec<Block<f32>>> = HashMap::new();
    for record in stack.records() {
        for (coord, block) in strategy.blocking_function(record)? {
            grouped.entry(coord).or_default().push(block);
        }
    }

    // reassemble each position across all records
    let mut coords: Vec<_> = grouped.keys().cloned().collect();
    coords.sort();
    for coord in coords {
        let items = grouped.remove(&coord).ok_or(BlockError::EmptyGroup)?;
        let combined = strategy.combining_function(&coord, items)?;
        println!(
            "  {} -> combined shape {:?}, records {}",
            coord,
            combined.data.shape(),
            combined.key.record_range(),
        );
    }

    Ok(())
}
