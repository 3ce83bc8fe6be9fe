//! Nonoverlapping tiling of full arrays into roughly equal blocks.
//!
//! [`SimpleBlocking`] plans the tiling from a units-per-dimension
//! specification; binding it to a source yields a [`SimpleStrategy`] whose
//! blocking function cuts every record into blocks and whose combining
//! function reassembles all records of one spatial position into a single
//! array.
//!
//! # Example
//!
//! ```
//! use blockrs::{BlockingStrategy, SimpleBlocking, SourceDesc, Units};
//! use ndarray::ArrayD;
//!
//! // a 12x12 image over 4 time points, cut into 4 blocks of 6x6
//! let source: SourceDesc<f32> = SourceDesc::new(vec![12, 12], 4);
//! let strategy = SimpleBlocking::new(Units::splits(vec![2, 2])?).bind(&source)?;
//!
//! let image = ArrayD::<f32>::zeros(ndarray::IxDyn(&[12, 12]));
//! let blocks = strategy.blocking_function(blockrs::ImageRecord::new(0, image))?;
//! assert_eq!(blocks.len(), 4);
//! assert_eq!(blocks[0].1.key.spatial_shape(), vec![6, 6]);
//! # Ok::<(), blockrs::BlockError>(())
//! ```

use ndarray::{ArrayD, Axis, IxDyn, SliceInfoElem};
use num_traits::Zero;

use crate::error::BlockError;
use crate::key::{Block, GroupingKey};
use crate::memseq::{avg_elements_per_block, splits_for_block_size};
use crate::slices::{
    AxisRange, BlockCoordinate, coordinate_product, slice_info, slices_from_pixels,
    slices_from_splits,
};
use crate::source::BlockSource;
use crate::strategy::{BlockClass, BlockingStrategy, ImageRecord};
use crate::units::Units;

/// Average block size above which binding logs a warning, in bytes.
pub const DEFAULT_MAX_BLOCK_SIZE: f64 = 500_000_000.0;

/// A plan for tiling full arrays into nonoverlapping blocks.
///
/// Cheap to construct; validation against a concrete source happens in
/// [`bind`](SimpleBlocking::bind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleBlocking {
    units: Units,
}

impl SimpleBlocking {
    /// Creates a plan from a validated units specification.
    pub fn new(units: Units) -> Self {
        Self { units }
    }

    /// Creates a splits-per-dimension plan.
    pub fn from_splits(values: Vec<usize>) -> Result<Self, BlockError> {
        Ok(Self::new(Units::splits(values)?))
    }

    /// Creates a pixels-per-dimension plan.
    pub fn from_pixels(values: Vec<usize>) -> Result<Self, BlockError> {
        Ok(Self::new(Units::pixels(values)?))
    }

    /// The plan's units specification.
    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Validates the plan against a source and computes the tiling.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::DimensionalityMismatch`] or
    /// [`BlockError::ExcessiveSplit`] when the units do not fit the
    /// source's shape.
    pub fn bind<S: BlockSource>(&self, source: &S) -> Result<SimpleStrategy<S::Elem>, BlockError> {
        let dims = source.dims();
        self.units.validate_for(&dims)?;
        let slices = match &self.units {
            Units::Splits(splits) => slices_from_splits(splits, &dims)?,
            Units::Pixels(pixels) => slices_from_pixels(pixels, &dims)?,
        };
        let strategy = SimpleStrategy {
            dims,
            nrecords: source.nrecords(),
            units: self.units.clone(),
            slices,
            _elem: std::marker::PhantomData,
        };
        warn_if_oversized(strategy.calc_average_block_size_impl(source.elem_size()));
        Ok(strategy)
    }

    /// Plans and binds a strategy whose average block byte-size most
    /// closely meets `block_size`.
    ///
    /// Searches split configurations from coarsest to finest (rightmost
    /// axis first) and picks the first whose average block is at least the
    /// requested size; a budget larger than the whole array yields a
    /// single block.
    ///
    /// # Example
    ///
    /// ```
    /// use blockrs::{SimpleBlocking, SourceDesc};
    ///
    /// let source: SourceDesc<u8> = SourceDesc::new(vec![5, 10, 3], 1);
    /// // one third of the array: one block per z-plane
    /// let strategy = SimpleBlocking::from_block_size(&source, 50.0)?;
    /// assert_eq!(strategy.block_count(), 3);
    /// # Ok::<(), blockrs::BlockError>(())
    /// ```
    pub fn from_block_size<S: BlockSource>(
        source: &S,
        block_size: f64,
    ) -> Result<SimpleStrategy<S::Elem>, BlockError> {
        let element_size = source.nrecords() * source.elem_size();
        let splits = splits_for_block_size(block_size, element_size, &source.dims());
        Self::new(Units::Splits(splits)).bind(source)
    }
}

pub(crate) fn warn_if_oversized(avg_bytes: f64) {
    if avg_bytes > DEFAULT_MAX_BLOCK_SIZE {
        log::warn!(
            "average block size {:.0} bytes exceeds {:.0}; consider finer splits",
            avg_bytes,
            DEFAULT_MAX_BLOCK_SIZE
        );
    }
}

/// A bound, immutable tiling of a concrete source.
///
/// Produced by [`SimpleBlocking::bind`]; safe to share across workers.
#[derive(Debug, Clone)]
pub struct SimpleStrategy<T> {
    dims: Vec<usize>,
    nrecords: usize,
    units: Units,
    slices: Vec<Vec<AxisRange>>,
    _elem: std::marker::PhantomData<T>,
}

impl<T> SimpleStrategy<T> {
    /// Spatial extent along each axis.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of records in the bound source.
    pub fn nrecords(&self) -> usize {
        self.nrecords
    }

    /// The computed tiling, one range sequence per axis.
    pub fn axis_slices(&self) -> &[Vec<AxisRange>] {
        &self.slices
    }

    /// Number of blocks per record.
    pub fn block_count(&self) -> usize {
        self.slices.iter().map(Vec::len).product()
    }

    /// All block coordinates, last axis varying fastest.
    pub fn coordinates(&self) -> Vec<BlockCoordinate> {
        coordinate_product(&self.slices)
    }

    fn calc_average_block_size_impl(&self, elem_size: usize) -> f64 {
        let elements = match &self.units {
            Units::Splits(splits) => avg_elements_per_block(&self.dims, splits),
            Units::Pixels(pixels) => pixels.iter().product::<usize>() as f64,
        };
        elements * elem_size as f64 * self.nrecords as f64
    }

    /// Builds the provenance key for the block at `coord` in `record`.
    pub(crate) fn make_key(&self, coord: &BlockCoordinate, record: usize) -> GroupingKey {
        let mut orig_shape = Vec::with_capacity(self.dims.len() + 1);
        orig_shape.push(self.nrecords);
        orig_shape.extend_from_slice(&self.dims);

        let mut ranges = Vec::with_capacity(coord.ranges().len() + 1);
        ranges.push(AxisRange::new(record, record + 1));
        ranges.extend_from_slice(coord.ranges());

        GroupingKey::new(orig_shape, ranges)
    }

    pub(crate) fn check_record(&self, record: &ImageRecord<T>) -> Result<(), BlockError> {
        if record.image.shape() != self.dims.as_slice() {
            return Err(BlockError::ShapeMismatch {
                expected: self.dims.clone(),
                actual: record.image.shape().to_vec(),
            });
        }
        if record.index >= self.nrecords {
            return Err(BlockError::IndexOutOfRange {
                index: record.index,
                max: self.nrecords.saturating_sub(1),
            });
        }
        Ok(())
    }
}

impl<T: Clone> SimpleStrategy<T> {
    /// Cuts one block out of a record's array and keys it.
    ///
    /// The extracted sub-array gets a length-1 record axis prepended; the
    /// key carries the block's position in original-array coordinates.
    pub fn extract_block(
        &self,
        image: &ArrayD<T>,
        coord: &BlockCoordinate,
        record: usize,
    ) -> Block<T> {
        let info = slice_info(coord.ranges());
        let data = image.slice(info.as_slice()).to_owned().insert_axis(Axis(0));
        Block::new(self.make_key(coord, record), data)
    }
}

impl<T: Clone + Zero> BlockingStrategy for SimpleStrategy<T> {
    type Record = ImageRecord<T>;
    type GroupId = BlockCoordinate;
    type Item = Block<T>;
    type Combined = Block<T>;

    fn block_class(&self) -> BlockClass {
        BlockClass::Simple
    }

    fn calc_average_block_size(&self) -> f64 {
        self.calc_average_block_size_impl(std::mem::size_of::<T>())
    }

    fn blocking_function(
        &self,
        record: ImageRecord<T>,
    ) -> Result<Vec<(BlockCoordinate, Block<T>)>, BlockError> {
        self.check_record(&record)?;
        Ok(self
            .coordinates()
            .into_iter()
            .map(|coord| {
                let block = self.extract_block(&record.image, &coord, record.index);
                (coord, block)
            })
            .collect())
    }

    /// Assembles all records of one spatial position into a single block.
    ///
    /// Allocates a zero array shaped `[nrecords] + block spatial shape`
    /// and writes each incoming block into its record slot. Callers must
    /// supply exactly one block per record index; a duplicate slot is not
    /// detected and the last write wins.
    fn combining_function(
        &self,
        _group: &BlockCoordinate,
        items: Vec<Block<T>>,
    ) -> Result<Block<T>, BlockError> {
        let first_key = items.first().map(|b| b.key.clone()).ok_or(BlockError::EmptyGroup)?;

        let spatial_shape: Vec<usize> = items[0].data.shape()[1..].to_vec();
        let mut out_shape = Vec::with_capacity(spatial_shape.len() + 1);
        out_shape.push(self.nrecords);
        out_shape.extend_from_slice(&spatial_shape);
        let mut out = ArrayD::<T>::zeros(IxDyn(&out_shape));

        for block in &items {
            if block.data.shape()[1..] != spatial_shape[..] {
                return Err(BlockError::ShapeMismatch {
                    expected: spatial_shape.clone(),
                    actual: block.data.shape()[1..].to_vec(),
                });
            }
            let record = block.key.record_range().start;
            if record >= self.nrecords {
                return Err(BlockError::IndexOutOfRange {
                    index: record,
                    max: self.nrecords.saturating_sub(1),
                });
            }

            let mut info = Vec::with_capacity(out_shape.len());
            info.push(SliceInfoElem::Slice {
                start: record as isize,
                end: Some(record as isize + 1),
                step: 1,
            });
            info.extend(std::iter::repeat_n(
                SliceInfoElem::Slice {
                    start: 0,
                    end: None,
                    step: 1,
                },
                spatial_shape.len(),
            ));
            out.slice_mut(info.as_slice()).assign(&block.data);
        }

        Ok(Block::new(first_key.as_temporally_concatenated(), out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceDesc;
    use ndarray::IxDyn;

    fn ramp(dims: &[usize], offset: f64) -> ArrayD<f64> {
        let total: usize = dims.iter().product();
        ArrayD::from_shape_vec(IxDyn(dims), (0..total).map(|i| i as f64 + offset).collect())
            .unwrap()
    }

    #[test]
    fn test_bind_computes_slices() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 2);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        assert_eq!(strategy.block_count(), 4);
        assert_eq!(strategy.axis_slices()[0].len(), 2);
    }

    #[test]
    fn test_bind_rejects_wrong_dimensionality() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12, 3], 2);
        let err = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap_err();
        assert!(matches!(err, BlockError::DimensionalityMismatch { .. }));
    }

    #[test]
    fn test_blocking_yields_expected_blocks() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 1);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        let blocks = strategy
            .blocking_function(ImageRecord::new(0, ramp(&[12, 12], 0.0)))
            .unwrap();
        assert_eq!(blocks.len(), 4);
        for (coord, block) in &blocks {
            assert_eq!(block.data.shape(), &[1, 6, 6]);
            assert_eq!(&block.key.coordinate(), coord);
        }
    }

    #[test]
    fn test_blocking_rejects_wrong_shape() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 1);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        let err = strategy
            .blocking_function(ImageRecord::new(0, ramp(&[12, 13], 0.0)))
            .unwrap_err();
        assert!(matches!(err, BlockError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_extract_block_values() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![4, 4], 1);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        let image = ramp(&[4, 4], 0.0);
        let coord = BlockCoordinate(vec![AxisRange::new(2, 4), AxisRange::new(0, 2)]);
        let block = strategy.extract_block(&image, &coord, 0);
        // rows 2..4, cols 0..2 of the row-major ramp
        assert_eq!(block.data.iter().copied().collect::<Vec<_>>(), vec![8.0, 9.0, 12.0, 13.0]);
    }

    #[test]
    fn test_combining_round_trip() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![6, 4], 3);
        let strategy = SimpleBlocking::from_splits(vec![3, 2])
            .unwrap()
            .bind(&source)
            .unwrap();

        let records: Vec<ArrayD<f64>> =
            (0..3).map(|t| ramp(&[6, 4], 1000.0 * t as f64)).collect();

        let mut grouped: std::collections::HashMap<BlockCoordinate, Vec<Block<f64>>> =
            std::collections::HashMap::new();
        for (t, image) in records.iter().enumerate() {
            for (coord, block) in strategy
                .blocking_function(ImageRecord::new(t, image.clone()))
                .unwrap()
            {
                grouped.entry(coord).or_default().push(block);
            }
        }

        for (coord, items) in grouped {
            let combined = strategy.combining_function(&coord, items).unwrap();
            assert_eq!(combined.key.record_range().to_range(), 0..3);
            for (t, image) in records.iter().enumerate() {
                let spatial = slice_info(coord.ranges());
                let expected = image.slice(spatial.as_slice()).to_owned();
                let got = combined.data.index_axis(Axis(0), t).to_owned();
                assert_eq!(got, expected, "record {} at {}", t, coord);
            }
        }
    }

    #[test]
    fn test_combining_empty_group() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![4, 4], 1);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        let coord = BlockCoordinate(vec![AxisRange::new(0, 2), AxisRange::new(0, 2)]);
        assert_eq!(
            strategy.combining_function(&coord, vec![]).unwrap_err(),
            BlockError::EmptyGroup
        );
    }

    #[test]
    fn test_average_block_size() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 5);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        // 36 elements * 8 bytes * 5 records
        assert_eq!(strategy.calc_average_block_size(), 36.0 * 8.0 * 5.0);
    }

    #[test]
    fn test_average_block_size_pixels() {
        let source: SourceDesc<u16> = SourceDesc::new(vec![12, 12], 2);
        let strategy = SimpleBlocking::from_pixels(vec![5, 5])
            .unwrap()
            .bind(&source)
            .unwrap();
        assert_eq!(strategy.calc_average_block_size(), 25.0 * 2.0 * 2.0);
    }

    #[test]
    fn test_from_block_size_z_planes() {
        let source: SourceDesc<u8> = SourceDesc::new(vec![5, 10, 3], 1);
        let strategy = SimpleBlocking::from_block_size(&source, 50.0).unwrap();
        assert_eq!(strategy.block_count(), 3);
        for coord in strategy.coordinates() {
            assert_eq!(coord.shape(), vec![5, 10, 1]);
        }
    }

    #[test]
    fn test_from_block_size_oversized_budget() {
        let source: SourceDesc<u8> = SourceDesc::new(vec![5, 10, 3], 1);
        let strategy = SimpleBlocking::from_block_size(&source, 1e12).unwrap();
        assert_eq!(strategy.block_count(), 1);
    }

    #[test]
    fn test_block_class() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![4, 4], 1);
        let strategy = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        assert_eq!(strategy.block_class(), BlockClass::Simple);
    }
}
