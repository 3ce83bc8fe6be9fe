//! Inverse blocking: rebuilding contiguous blocks from scattered voxels.
//!
//! Inputs are individual per-voxel records (an N-d coordinate plus one
//! value per record index); outputs are spatially-contiguous blocks.
//! Voxels are assigned to blocks by a single binary search over each
//! block's maximum column-major linear index, which is what forces the
//! monotonic-splitting constraint: scanning axes from last to first, axes
//! may be fully split until the first incompletely split axis, and every
//! axis before that one must be unsplit. Any other configuration would
//! give blocks interleaved, non-contiguous linear index ranges.
//!
//! # Example
//!
//! ```
//! use blockrs::{BlockingStrategy, SeriesBlocking, SeriesRecord, SourceDesc};
//!
//! let source: SourceDesc<f64> = SourceDesc::new(vec![4, 4, 4], 3);
//! let strategy = SeriesBlocking::new(vec![1, 1, 2])?.bind(&source)?;
//! assert_eq!(strategy.nblocks(), 2);
//!
//! // voxel (0,0,3) lands in the upper z block
//! let record = SeriesRecord::new(vec![0, 0, 3], vec![1.0, 2.0, 3.0]);
//! let assigned = strategy.blocking_function(record)?;
//! assert_eq!(assigned[0].0, 1);
//! # Ok::<(), blockrs::BlockError>(())
//! ```

use ndarray::{ArrayD, IxDyn};
use num_traits::Zero;

use crate::error::BlockError;
use crate::index::{column_major_strides, sub_to_ind};
use crate::key::{Block, GroupingKey};
use crate::memseq::{avg_elements_per_block, splits_for_block_size};
use crate::slices::{AxisRange, BlockCoordinate, coordinate_product, slices_from_splits};
use crate::source::BlockSource;
use crate::strategy::simple::warn_if_oversized;
use crate::strategy::{BlockClass, BlockingStrategy, SeriesRecord};
use crate::units::Units;

/// A plan for recombining per-voxel series records into blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesBlocking {
    splits: Vec<usize>,
}

impl SeriesBlocking {
    /// Creates a plan from splits per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidUnits`] if any split count is zero.
    /// The monotonic-splitting constraint is checked against the source
    /// shape in [`bind`](SeriesBlocking::bind).
    pub fn new(splits: Vec<usize>) -> Result<Self, BlockError> {
        crate::units::normalize(&splits)?;
        Ok(Self { splits })
    }

    /// The plan's splits per dimension.
    pub fn splits(&self) -> &[usize] {
        &self.splits
    }

    /// Validates the plan against a source and precomputes the block
    /// coordinates and their linear index table.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::DimensionalityMismatch`],
    /// [`BlockError::ExcessiveSplit`], or
    /// [`BlockError::InvalidSplitConfiguration`] when the splits do not
    /// fit the source's shape.
    pub fn bind<S: BlockSource>(&self, source: &S) -> Result<SeriesStrategy<S::Elem>, BlockError> {
        let dims = source.dims();
        let nrecords = source.nrecords();
        Units::Splits(self.splits.clone()).validate_for(&dims)?;
        self.validate_monotonic(&dims)?;

        let slices = slices_from_splits(&self.splits, &dims)?;

        // block coordinates in column-major iteration order: the first
        // axis varies fastest
        let rev_slices: Vec<Vec<AxisRange>> = slices.iter().rev().cloned().collect();
        let strides = column_major_strides(&dims);
        let mut indexed: Vec<(usize, BlockCoordinate)> = coordinate_product(&rev_slices)
            .into_iter()
            .map(|coord| {
                let mut ranges = coord.0;
                ranges.reverse();
                // max corner is inclusive; range stops are bounded by dims
                let lin = ranges
                    .iter()
                    .zip(&strides)
                    .map(|(r, s)| (r.stop - 1) * s)
                    .sum();
                (lin, BlockCoordinate(ranges))
            })
            .collect();
        indexed.sort_by_key(|(lin, _)| *lin);

        let (lin_indices, blocks) = indexed.into_iter().unzip();
        let strategy = SeriesStrategy {
            dims,
            nrecords,
            splits: self.splits.clone(),
            blocks,
            lin_indices,
            _elem: std::marker::PhantomData,
        };
        warn_if_oversized(strategy.calc_average_block_size_impl(source.elem_size()));
        Ok(strategy)
    }

    /// Plans and binds a series strategy whose average block byte-size
    /// most closely meets `block_size`.
    ///
    /// The search increments splits rightmost axis first, so every
    /// configuration it can produce satisfies the monotonic-splitting
    /// constraint.
    pub fn from_block_size<S: BlockSource>(
        source: &S,
        block_size: f64,
    ) -> Result<SeriesStrategy<S::Elem>, BlockError> {
        let element_size = source.nrecords() * source.elem_size();
        let splits = splits_for_block_size(block_size, element_size, &source.dims());
        Self::new(splits)?.bind(source)
    }

    fn validate_monotonic(&self, dims: &[usize]) -> Result<(), BlockError> {
        let mut saw_partial = false;
        for (&s, &d) in self.splits.iter().zip(dims).rev() {
            if saw_partial && s > 1 {
                return Err(BlockError::InvalidSplitConfiguration {
                    splits: self.splits.clone(),
                    dims: dims.to_vec(),
                });
            }
            if s < d {
                saw_partial = true;
            }
        }
        Ok(())
    }
}

/// A bound, immutable recombination plan for a concrete series source.
#[derive(Debug, Clone)]
pub struct SeriesStrategy<T> {
    dims: Vec<usize>,
    nrecords: usize,
    splits: Vec<usize>,
    blocks: Vec<BlockCoordinate>,
    lin_indices: Vec<usize>,
    _elem: std::marker::PhantomData<T>,
}

impl<T> SeriesStrategy<T> {
    /// Spatial extent along each axis.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of records (values per voxel).
    pub fn nrecords(&self) -> usize {
        self.nrecords
    }

    /// Number of blocks the series will be recombined into.
    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    /// Per-block maximum column-major linear indices, ascending.
    pub fn linear_indices(&self) -> &[usize] {
        &self.lin_indices
    }

    /// The coordinate of block `n`.
    pub fn block_coordinate(&self, n: usize) -> Option<&BlockCoordinate> {
        self.blocks.get(n)
    }

    fn calc_average_block_size_impl(&self, elem_size: usize) -> f64 {
        avg_elements_per_block(&self.dims, &self.splits) * elem_size as f64 * self.nrecords as f64
    }
}

impl<T: Clone + Zero> BlockingStrategy for SeriesStrategy<T> {
    type Record = SeriesRecord<T>;
    type GroupId = usize;
    type Item = SeriesRecord<T>;
    type Combined = Block<T>;

    fn block_class(&self) -> BlockClass {
        BlockClass::Simple
    }

    fn calc_average_block_size(&self) -> f64 {
        self.calc_average_block_size_impl(std::mem::size_of::<T>())
    }

    /// Assigns one voxel record to its block number.
    ///
    /// The voxel's column-major linear index is binary searched against
    /// the per-block maxima; the record itself passes through untouched.
    fn blocking_function(
        &self,
        record: SeriesRecord<T>,
    ) -> Result<Vec<(usize, SeriesRecord<T>)>, BlockError> {
        let linear = sub_to_ind(&record.coord, &self.dims)?;
        let block = self.lin_indices.partition_point(|&max| max < linear);
        if block == self.lin_indices.len() {
            // the last table entry is the array's far corner
            return Err(BlockError::IndexOutOfRange {
                index: linear,
                max: *self.lin_indices.last().unwrap_or(&0),
            });
        }
        Ok(vec![(block, record)])
    }

    /// Assembles all voxels collected for one block number.
    ///
    /// Allocates a zero array shaped `[nrecords] + block spatial shape`
    /// and writes each voxel's value vector down the record axis at its
    /// offset within the block.
    fn combining_function(
        &self,
        group: &usize,
        items: Vec<SeriesRecord<T>>,
    ) -> Result<Block<T>, BlockError> {
        let coord = self.blocks.get(*group).ok_or(BlockError::IndexOutOfRange {
            index: *group,
            max: self.blocks.len().saturating_sub(1),
        })?;

        let spatial_shape = coord.shape();
        let origin = coord.origin();
        let mut out_shape = Vec::with_capacity(spatial_shape.len() + 1);
        out_shape.push(self.nrecords);
        out_shape.extend_from_slice(&spatial_shape);
        let mut out = ArrayD::<T>::zeros(IxDyn(&out_shape));

        let mut slot = vec![0usize; out_shape.len()];
        for record in &items {
            if record.values.len() != self.nrecords {
                return Err(BlockError::ShapeMismatch {
                    expected: vec![self.nrecords],
                    actual: vec![record.values.len()],
                });
            }
            if record.coord.len() != self.dims.len() {
                return Err(BlockError::DimensionalityMismatch {
                    expected: self.dims.len(),
                    actual: record.coord.len(),
                });
            }
            for (axis, (&c, range)) in record.coord.iter().zip(coord.ranges()).enumerate() {
                if !range.contains(c) {
                    return Err(BlockError::IndexOutOfRange {
                        index: c,
                        max: range.stop.saturating_sub(1),
                    });
                }
                slot[axis + 1] = c - origin[axis];
            }
            for (t, value) in record.values.iter().enumerate() {
                slot[0] = t;
                out[IxDyn(&slot)] = value.clone();
            }
        }

        let mut orig_shape = Vec::with_capacity(self.dims.len() + 1);
        orig_shape.push(self.nrecords);
        orig_shape.extend_from_slice(&self.dims);

        let mut ranges = Vec::with_capacity(coord.ranges().len() + 1);
        ranges.push(AxisRange::new(0, self.nrecords));
        ranges.extend_from_slice(coord.ranges());

        Ok(Block::new(GroupingKey::new(orig_shape, ranges), out))
    }
}
