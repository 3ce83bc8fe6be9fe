//! Halo-padded tiling for neighborhood-dependent operations.
//!
//! Pads every block of a simple tiling with surrounding context, clamped
//! at the array edges. Each emitted key records the pad actually applied
//! at every boundary and the core sub-ranges within the padded block, so
//! consumers can strip the halo without recomputing coordinates.
//!
//! # Example
//!
//! ```
//! use blockrs::{BlockingStrategy, PaddedBlocking, SourceDesc, Units};
//! use ndarray::ArrayD;
//!
//! let source: SourceDesc<f32> = SourceDesc::new(vec![12, 12], 1);
//! let strategy = PaddedBlocking::new(Units::splits(vec![2, 2])?, 2)?.bind(&source)?;
//!
//! let image = ArrayD::<f32>::zeros(ndarray::IxDyn(&[12, 12]));
//! let blocks = strategy.blocking_function(blockrs::ImageRecord::new(0, image))?;
//! // interior boundaries gain 2 pixels of halo; array edges gain none
//! assert_eq!(blocks[0].1.data.shape(), &[1, 8, 8]);
//! # Ok::<(), blockrs::BlockError>(())
//! ```

use ndarray::{ArrayD, Axis, IxDyn, SliceInfoElem};
use num_traits::Zero;

use crate::error::BlockError;
use crate::key::{PaddedBlock, PaddedGroupingKey};
use crate::slices::{AxisRange, BlockCoordinate, slice_info};
use crate::source::BlockSource;
use crate::strategy::simple::{SimpleBlocking, SimpleStrategy};
use crate::strategy::{BlockClass, BlockingStrategy, ImageRecord};
use crate::units::Units;

/// Halo width to reach for when a caller has no neighborhood size in mind.
pub const DEFAULT_PADDING: usize = 10;

/// A padding request: one halo width for all axes, or one per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Padding {
    /// The same halo width on every spatial axis.
    Uniform(usize),
    /// An explicit halo width per spatial axis.
    PerAxis(Vec<usize>),
}

impl From<usize> for Padding {
    fn from(pad: usize) -> Self {
        Padding::Uniform(pad)
    }
}

impl From<Vec<usize>> for Padding {
    fn from(pads: Vec<usize>) -> Self {
        Padding::PerAxis(pads)
    }
}

impl Padding {
    /// Broadcasts the request to one value per axis.
    fn broadcast(&self, ndim: usize) -> Result<Vec<usize>, BlockError> {
        match self {
            Padding::Uniform(pad) => Ok(vec![*pad; ndim]),
            Padding::PerAxis(pads) => {
                if pads.len() != ndim {
                    return Err(BlockError::InvalidPadding {
                        message: format!(
                            "padding {:?} must have one value per axis (expected {})",
                            pads, ndim
                        ),
                    });
                }
                Ok(pads.clone())
            }
        }
    }
}

/// A plan for tiling with halo padding around every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBlocking {
    inner: SimpleBlocking,
    padding: Padding,
}

impl PaddedBlocking {
    /// Creates a plan from a units specification and a padding request.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidPadding`] if a per-axis padding's
    /// length differs from the units specification's.
    pub fn new(units: Units, padding: impl Into<Padding>) -> Result<Self, BlockError> {
        let padding = padding.into();
        // catch length mismatches at planning time; bind re-checks against
        // the source dimensionality
        if let Padding::PerAxis(pads) = &padding {
            if pads.len() != units.values().len() {
                return Err(BlockError::InvalidPadding {
                    message: format!(
                        "padding {:?} must be of equal size as the units tuple {:?}",
                        pads,
                        units.values()
                    ),
                });
            }
        }
        Ok(Self {
            inner: SimpleBlocking::new(units),
            padding,
        })
    }

    /// The plan's padding request.
    pub fn padding(&self) -> &Padding {
        &self.padding
    }

    /// Validates the plan against a source and computes the tiling.
    pub fn bind<S: BlockSource>(&self, source: &S) -> Result<PaddedStrategy<S::Elem>, BlockError> {
        let inner = self.inner.bind(source)?;
        let padding = self.padding.broadcast(inner.dims().len())?;
        Ok(PaddedStrategy { inner, padding })
    }

    /// Plans and binds a padded strategy whose average (unpadded) block
    /// byte-size most closely meets `block_size`.
    ///
    /// Pass [`DEFAULT_PADDING`] when no particular neighborhood size is
    /// needed.
    pub fn from_block_size<S: BlockSource>(
        source: &S,
        block_size: f64,
        padding: impl Into<Padding>,
    ) -> Result<PaddedStrategy<S::Elem>, BlockError> {
        let simple = SimpleBlocking::from_block_size(source, block_size)?;
        let padding = padding.into().broadcast(simple.dims().len())?;
        Ok(PaddedStrategy {
            inner: simple,
            padding,
        })
    }
}

/// A bound, immutable padded tiling of a concrete source.
#[derive(Debug, Clone)]
pub struct PaddedStrategy<T> {
    inner: SimpleStrategy<T>,
    padding: Vec<usize>,
}

impl<T> PaddedStrategy<T> {
    /// Spatial extent along each axis.
    pub fn dims(&self) -> &[usize] {
        self.inner.dims()
    }

    /// Number of records in the bound source.
    pub fn nrecords(&self) -> usize {
        self.inner.nrecords()
    }

    /// The halo width per spatial axis.
    pub fn padding(&self) -> &[usize] {
        &self.padding
    }

    /// The underlying unpadded tiling.
    pub fn core(&self) -> &SimpleStrategy<T> {
        &self.inner
    }

    /// Number of blocks per record.
    pub fn block_count(&self) -> usize {
        self.inner.block_count()
    }
}

impl<T: Clone> PaddedStrategy<T> {
    /// Cuts one halo-padded block out of a record's array and keys it.
    ///
    /// The padded range on each axis is the core range widened by the
    /// requested pad and clamped to the array; the key records the pad
    /// actually applied and where the core sits inside the padded block.
    pub fn extract_block(
        &self,
        image: &ArrayD<T>,
        coord: &BlockCoordinate,
        record: usize,
    ) -> PaddedBlock<T> {
        let dims = self.inner.dims();

        let mut padded_spatial = Vec::with_capacity(dims.len());
        let mut actual_pad = Vec::with_capacity(dims.len());
        for ((core, &pad), &extent) in coord.ranges().iter().zip(&self.padding).zip(dims) {
            let start = core.start.saturating_sub(pad);
            let stop = (core.stop + pad).min(extent);
            padded_spatial.push(AxisRange::new(start, stop));
            actual_pad.push((core.start - start, stop - core.stop));
        }

        let info = slice_info(&padded_spatial);
        let data = image.slice(info.as_slice()).to_owned().insert_axis(Axis(0));

        // core sub-ranges within the padded block, from the actual pads
        let mut core_in_padded = Vec::with_capacity(dims.len() + 1);
        core_in_padded.push(AxisRange::new(0, 1));
        for (&(lo, hi), padded) in actual_pad.iter().zip(&padded_spatial) {
            core_in_padded.push(AxisRange::new(lo, padded.len() - hi));
        }

        let mut padded_ranges = Vec::with_capacity(dims.len() + 1);
        padded_ranges.push(AxisRange::new(record, record + 1));
        padded_ranges.extend_from_slice(&padded_spatial);

        let key = PaddedGroupingKey::new(
            self.inner.make_key(coord, record),
            padded_ranges,
            self.padding.clone(),
            data.shape().to_vec(),
            core_in_padded,
        );
        PaddedBlock::new(key, data)
    }
}

impl<T: Clone + Zero> BlockingStrategy for PaddedStrategy<T> {
    type Record = ImageRecord<T>;
    type GroupId = BlockCoordinate;
    type Item = PaddedBlock<T>;
    type Combined = PaddedBlock<T>;

    fn block_class(&self) -> BlockClass {
        BlockClass::Padded
    }

    fn calc_average_block_size(&self) -> f64 {
        self.inner.calc_average_block_size()
    }

    fn blocking_function(
        &self,
        record: ImageRecord<T>,
    ) -> Result<Vec<(BlockCoordinate, PaddedBlock<T>)>, BlockError> {
        self.inner.check_record(&record)?;
        Ok(self
            .inner
            .coordinates()
            .into_iter()
            .map(|coord| {
                let block = self.extract_block(&record.image, &coord, record.index);
                (coord, block)
            })
            .collect())
    }

    /// Assembles all records of one spatial position into a single padded
    /// block, keyed for later halo trimming.
    ///
    /// The same single-block-per-record contract as the simple strategy
    /// applies; a duplicate record slot is not detected and the last
    /// write wins.
    fn combining_function(
        &self,
        _group: &BlockCoordinate,
        items: Vec<PaddedBlock<T>>,
    ) -> Result<PaddedBlock<T>, BlockError> {
        let first_key = items.first().map(|b| b.key.clone()).ok_or(BlockError::EmptyGroup)?;
        let nrecords = self.inner.nrecords();

        let spatial_shape: Vec<usize> = items[0].data.shape()[1..].to_vec();
        let mut out_shape = Vec::with_capacity(spatial_shape.len() + 1);
        out_shape.push(nrecords);
        out_shape.extend_from_slice(&spatial_shape);
        let mut out = ArrayD::<T>::zeros(IxDyn(&out_shape));

        for block in &items {
            if block.data.shape()[1..] != spatial_shape[..] {
                return Err(BlockError::ShapeMismatch {
                    expected: spatial_shape.clone(),
                    actual: block.data.shape()[1..].to_vec(),
                });
            }
            let record = block.key.core().record_range().start;
            if record >= nrecords {
                return Err(BlockError::IndexOutOfRange {
                    index: record,
                    max: nrecords.saturating_sub(1),
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

        Ok(PaddedBlock::new(first_key.as_temporally_concatenated(), out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceDesc;

    fn ramp(dims: &[usize], offset: f64) -> ArrayD<f64> {
        let total: usize = dims.iter().product();
        ArrayD::from_shape_vec(IxDyn(dims), (0..total).map(|i| i as f64 + offset).collect())
            .unwrap()
    }

    fn bound(padding: impl Into<Padding>) -> PaddedStrategy<f64> {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 1);
        PaddedBlocking::new(Units::splits(vec![2, 2]).unwrap(), padding)
            .unwrap()
            .bind(&source)
            .unwrap()
    }

    #[test]
    fn test_padding_broadcast() {
        let strategy = bound(2usize);
        assert_eq!(strategy.padding(), &[2, 2]);
    }

    #[test]
    fn test_padding_length_mismatch() {
        let err =
            PaddedBlocking::new(Units::splits(vec![2, 2]).unwrap(), vec![1usize, 2, 3]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidPadding { .. }));
    }

    #[test]
    fn test_actual_padding_clamped_at_edges() {
        let strategy = bound(2usize);
        let image = ramp(&[12, 12], 0.0);
        let coord = BlockCoordinate(vec![AxisRange::new(0, 6), AxisRange::new(6, 12)]);
        let block = strategy.extract_block(&image, &coord, 0);

        // axis 0 starts at the edge: no leading pad, 2 trailing
        // axis 1 ends at the edge: 2 leading, no trailing
        assert_eq!(block.key.padded_ranges()[1], AxisRange::new(0, 8));
        assert_eq!(block.key.padded_ranges()[2], AxisRange::new(4, 12));
        assert_eq!(block.data.shape(), &[1, 8, 8]);
        assert_eq!(block.key.core_in_padded()[1], AxisRange::new(0, 6));
        assert_eq!(block.key.core_in_padded()[2], AxisRange::new(2, 8));
    }

    #[test]
    fn test_trim_recovers_simple_extraction() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![12, 12], 1);
        let padded = bound(3usize);
        let simple = SimpleBlocking::from_splits(vec![2, 2])
            .unwrap()
            .bind(&source)
            .unwrap();
        let image = ramp(&[12, 12], 0.0);

        for coord in simple.coordinates() {
            let plain = simple.extract_block(&image, &coord, 0);
            let trimmed = padded.extract_block(&image, &coord, 0).trim_to_core();
            assert_eq!(trimmed.key, plain.key, "at {}", coord);
            assert_eq!(trimmed.data, plain.data, "at {}", coord);
        }
    }

    #[test]
    fn test_combining_keeps_padded_key() {
        let strategy = bound(2usize);
        let image = ramp(&[12, 12], 0.0);
        let blocks = strategy
            .blocking_function(ImageRecord::new(0, image))
            .unwrap();
        let (coord, block) = blocks.into_iter().next().unwrap();
        let combined = strategy.combining_function(&coord, vec![block]).unwrap();
        assert_eq!(combined.key.core().record_range().to_range(), 0..1);
        assert_eq!(combined.key.padded_shape()[0], 1);
    }

    #[test]
    fn test_block_class() {
        assert_eq!(bound(1usize).block_class(), BlockClass::Padded);
    }

    #[test]
    fn test_zero_padding_matches_simple_shapes() {
        let strategy = bound(0usize);
        let image = ramp(&[12, 12], 0.0);
        let blocks = strategy
            .blocking_function(ImageRecord::new(0, image))
            .unwrap();
        for (_, block) in blocks {
            assert_eq!(block.data.shape(), &[1, 6, 6]);
        }
    }
}
