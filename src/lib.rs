//! blockrs
//!
//! Blocking of N-dimensional array datasets for data-parallel execution.
//!
//! `blockrs` partitions large multi-dimensional arrays (image volumes
//! captured over many time points, or per-voxel time series) into
//! independently processable blocks, and later reassembles processed
//! blocks back into full arrays. It provides:
//!
//! - exact, invariant-preserving tiling of coordinate spaces
//! - a memory-budget-driven search for block granularity
//! - halo padding with recorded trim information
//! - the inverse direction: rebuilding blocks from scattered voxels
//!
//! The crate intentionally:
//! - does NOT run the numerical kernels applied to blocks
//! - does NOT schedule, retry, or distribute work
//! - does NOT persist anything
//!
//! It only does one thing: **compute how to cut arrays up and put them
//! back together**, and move data into and out of those cuts.
//!
//! # Forward: tiling a volume stack
//!
//! ```
//! use blockrs::{BlockingStrategy, ImageRecord, SimpleBlocking, SourceDesc, Units};
//! use ndarray::ArrayD;
//!
//! // a 12x12 image over 4 time points, as 4 blocks of 6x6
//! let source: SourceDesc<f32> = SourceDesc::new(vec![12, 12], 4);
//! let strategy = SimpleBlocking::new(Units::splits(vec![2, 2])?).bind(&source)?;
//!
//! let image = ArrayD::<f32>::zeros(ndarray::IxDyn(&[12, 12]));
//! for (coord, block) in strategy.blocking_function(ImageRecord::new(0, image))? {
//!     println!("block {} holds {:?}", coord, block.shape());
//! }
//! # Ok::<(), blockrs::BlockError>(())
//! ```
//!
//! # Sized by byte budget
//!
//! ```
//! use blockrs::{SimpleBlocking, SourceDesc};
//!
//! let source: SourceDesc<u8> = SourceDesc::new(vec![5, 10, 3], 1);
//! // one third of the array per block: one block per z-plane
//! let strategy = SimpleBlocking::from_block_size(&source, 50.0)?;
//! assert_eq!(strategy.block_count(), 3);
//! # Ok::<(), blockrs::BlockError>(())
//! ```
//!
//! An external data-parallel substrate drives the two halves: it applies
//! [`BlockingStrategy::blocking_function`] to each record independently,
//! groups the outputs by their grouping id, and applies
//! [`BlockingStrategy::combining_function`] once per group. Bound
//! strategies are immutable and `Send + Sync` for element types that are,
//! so the same instance can serve every worker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod index;
pub mod key;
pub mod slices;
pub mod source;
pub mod strategy;
pub mod units;
pub mod util;

mod memseq; // internal block-size search sequence

//
// Public surface (intentionally tiny)
//

pub use error::BlockError;
pub use key::{Block, GroupingKey, PaddedBlock, PaddedGroupingKey};
pub use slices::{AxisRange, BlockCoordinate};
pub use source::{BlockSource, ImageStack, SourceDesc};
pub use strategy::padded::{DEFAULT_PADDING, PaddedBlocking, PaddedStrategy, Padding};
pub use strategy::series::{SeriesBlocking, SeriesStrategy};
pub use strategy::simple::{DEFAULT_MAX_BLOCK_SIZE, SimpleBlocking, SimpleStrategy};
pub use strategy::{BlockClass, BlockingStrategy, ImageRecord, SeriesRecord};
pub use units::{UnitKind, Units};
