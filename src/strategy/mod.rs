//! Blocking strategies.
//!
//! Three strategies share one capability interface:
//!
//! - [`simple::SimpleBlocking`] - tiles a full array per record
//! - [`padded::PaddedBlocking`] - tiles with a halo around each block
//! - [`series::SeriesBlocking`] - the inverse direction: rebuilds
//!   spatially-contiguous blocks from scattered per-voxel records
//!
//! Construction is two-phase. A *plan* holds raw unit parameters and is
//! cheap to create; `bind` validates the plan against a
//! [`BlockSource`](crate::BlockSource) and returns an immutable *bound
//! strategy*. Only bound strategies expose blocking, combining, and sizing
//! operations, so none of them can be called on unvalidated state. A bound
//! strategy is `Send + Sync` whenever its element type is, and is safe to
//! invoke concurrently from data-parallel workers.

pub mod padded;
pub mod series;
pub mod simple;

use std::hash::Hash;

use ndarray::ArrayD;

use crate::error::BlockError;

/// Which block flavor a strategy produces.
///
/// Consumers use this tag to pick the matching downstream handling;
/// padded blocks carry halo-trim metadata, simple blocks do not. The
/// series strategy rebuilds plain blocks and reports [`BlockClass::Simple`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockClass {
    /// Nonoverlapping blocks with plain grouping keys.
    Simple,
    /// Halo-padded blocks with trim metadata in their keys.
    Padded,
}

/// One input record for the forward strategies: a full spatial array
/// observed at one record index (time point).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord<T> {
    /// The record (time point) index.
    pub index: usize,
    /// The full spatial array at this record.
    pub image: ArrayD<T>,
}

impl<T> ImageRecord<T> {
    /// Creates a record.
    pub fn new(index: usize, image: ArrayD<T>) -> Self {
        Self { index, image }
    }
}

/// One input record for the series strategy: a single voxel's coordinate
/// and its values across all records.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord<T> {
    /// The voxel's N-d spatial coordinate.
    pub coord: Vec<usize>,
    /// The voxel's value at each record index.
    pub values: Vec<T>,
}

impl<T> SeriesRecord<T> {
    /// Creates a record.
    pub fn new(coord: Vec<usize>, values: Vec<T>) -> Self {
        Self { coord, values }
    }
}

/// The capability interface shared by all bound strategies.
///
/// An external data-parallel substrate applies [`blocking_function`] to
/// each input record independently, groups the outputs by their
/// `GroupId`, and applies [`combining_function`] once per group. Both
/// calls are pure, synchronous transforms over immutable strategy state.
///
/// [`blocking_function`]: BlockingStrategy::blocking_function
/// [`combining_function`]: BlockingStrategy::combining_function
pub trait BlockingStrategy {
    /// The input record type.
    type Record;

    /// The grouping id the substrate groups blocked outputs by.
    type GroupId: Eq + Hash + Clone;

    /// One blocked output item.
    type Item;

    /// The assembled output of a combining call.
    type Combined;

    /// Which block flavor this strategy produces.
    fn block_class(&self) -> BlockClass;

    /// Estimated average block size in bytes.
    fn calc_average_block_size(&self) -> f64;

    /// Transforms one input record into keyed blocked outputs.
    fn blocking_function(
        &self,
        record: Self::Record,
    ) -> Result<Vec<(Self::GroupId, Self::Item)>, BlockError>;

    /// Assembles all items collected for one group into a single block.
    fn combining_function(
        &self,
        group: &Self::GroupId,
        items: Vec<Self::Item>,
    ) -> Result<Self::Combined, BlockError>;
}
