//! Grouping keys - the provenance attached to every block.
//!
//! - [`GroupingKey`] - original full shape plus the ranges a block occupies
//! - [`PaddedGroupingKey`] - adds halo extraction ranges and the core
//!   sub-ranges needed to trim the halo off again
//! - [`Block`] / [`PaddedBlock`] - a key paired with its array data
//!
//! Keys are created once by a blocking function and consumed read-only by
//! the combining step; they are never mutated after creation.

use ndarray::ArrayD;

use crate::slices::{AxisRange, BlockCoordinate, slice_info};

/// Provenance for one block of a tiled array.
///
/// Shapes and ranges always carry the record (temporal) axis first,
/// followed by the spatial axes in original-array coordinates.
///
/// # Example
///
/// ```
/// use blockrs::{AxisRange, GroupingKey};
///
/// // block occupying x 0..6, y 6..12 of a 12x12 image at record 3 of 10
/// let key = GroupingKey::new(
///     vec![10, 12, 12],
///     vec![AxisRange::new(3, 4), AxisRange::new(0, 6), AxisRange::new(6, 12)],
/// );
/// assert_eq!(key.spatial_shape(), vec![6, 6]);
/// assert_eq!(key.record_range().to_range(), 3..4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingKey {
    /// Full shape of the original data, record axis first.
    orig_shape: Vec<usize>,
    /// The ranges this block occupies, record axis first.
    ranges: Vec<AxisRange>,
}

impl GroupingKey {
    /// Creates a key from an original shape and occupied ranges.
    pub fn new(orig_shape: Vec<usize>, ranges: Vec<AxisRange>) -> Self {
        debug_assert_eq!(orig_shape.len(), ranges.len());
        Self { orig_shape, ranges }
    }

    /// Full shape of the original data, record axis first.
    pub fn orig_shape(&self) -> &[usize] {
        &self.orig_shape
    }

    /// The ranges this block occupies, record axis first.
    pub fn ranges(&self) -> &[AxisRange] {
        &self.ranges
    }

    /// Number of records in the original data.
    pub fn nrecords(&self) -> usize {
        self.orig_shape[0]
    }

    /// The record-axis range.
    pub fn record_range(&self) -> AxisRange {
        self.ranges[0]
    }

    /// The spatial ranges (record axis stripped).
    pub fn spatial_ranges(&self) -> &[AxisRange] {
        &self.ranges[1..]
    }

    /// The block's spatial shape.
    pub fn spatial_shape(&self) -> Vec<usize> {
        self.spatial_ranges().iter().map(AxisRange::len).collect()
    }

    /// The block's spatial position, usable as a grouping id.
    pub fn coordinate(&self) -> BlockCoordinate {
        BlockCoordinate(self.spatial_ranges().to_vec())
    }

    /// The same key with the record axis spanning all records.
    ///
    /// Combining functions emit this for the assembled output block.
    pub fn as_temporally_concatenated(&self) -> Self {
        let mut ranges = self.ranges.clone();
        ranges[0] = AxisRange::new(0, self.nrecords());
        Self {
            orig_shape: self.orig_shape.clone(),
            ranges,
        }
    }
}

impl std::fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupingKey({} of {:?})", self.coordinate(), self.orig_shape)
    }
}

/// Provenance for one halo-padded block.
///
/// Composes the unpadded [`GroupingKey`] with everything needed to strip
/// the halo off again: the padded extraction ranges, the requested pad per
/// spatial axis, the actual padded shape, and the core sub-ranges *within*
/// the padded block. Near array edges the actual pad may be smaller than
/// requested; the recorded core sub-ranges account for that, so trimming
/// needs no further coordinate arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaddedGroupingKey {
    /// The unpadded key (core ranges in original-array coordinates).
    core: GroupingKey,
    /// The padded extraction ranges, record axis first.
    padded_ranges: Vec<AxisRange>,
    /// Requested pad per spatial axis.
    padding: Vec<usize>,
    /// Shape of the padded block, record axis first.
    padded_shape: Vec<usize>,
    /// Ranges within the padded block that recover the core region,
    /// record axis first.
    core_in_padded: Vec<AxisRange>,
}

impl PaddedGroupingKey {
    /// Creates a padded key.
    pub fn new(
        core: GroupingKey,
        padded_ranges: Vec<AxisRange>,
        padding: Vec<usize>,
        padded_shape: Vec<usize>,
        core_in_padded: Vec<AxisRange>,
    ) -> Self {
        debug_assert_eq!(padded_ranges.len(), padded_shape.len());
        debug_assert_eq!(core_in_padded.len(), padded_shape.len());
        Self {
            core,
            padded_ranges,
            padding,
            padded_shape,
            core_in_padded,
        }
    }

    /// The unpadded key.
    pub fn core(&self) -> &GroupingKey {
        &self.core
    }

    /// The padded extraction ranges, record axis first.
    pub fn padded_ranges(&self) -> &[AxisRange] {
        &self.padded_ranges
    }

    /// Requested pad per spatial axis.
    pub fn padding(&self) -> &[usize] {
        &self.padding
    }

    /// Shape of the padded block, record axis first.
    pub fn padded_shape(&self) -> &[usize] {
        &self.padded_shape
    }

    /// Ranges within the padded block that recover the core region.
    pub fn core_in_padded(&self) -> &[AxisRange] {
        &self.core_in_padded
    }

    /// The core spatial position, usable as a grouping id.
    pub fn coordinate(&self) -> BlockCoordinate {
        self.core.coordinate()
    }

    /// The same key with the record axis spanning all records.
    pub fn as_temporally_concatenated(&self) -> Self {
        let nrecords = self.core.nrecords();
        let mut padded_ranges = self.padded_ranges.clone();
        padded_ranges[0] = AxisRange::new(0, nrecords);
        let mut padded_shape = self.padded_shape.clone();
        padded_shape[0] = nrecords;
        let mut core_in_padded = self.core_in_padded.clone();
        core_in_padded[0] = AxisRange::new(0, nrecords);
        Self {
            core: self.core.as_temporally_concatenated(),
            padded_ranges,
            padding: self.padding.clone(),
            padded_shape,
            core_in_padded,
        }
    }
}

impl std::fmt::Display for PaddedGroupingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PaddedGroupingKey({} pad {:?} of {:?})",
            self.core.coordinate(),
            self.padding,
            self.core.orig_shape()
        )
    }
}

/// A grouping key paired with its block data.
///
/// The array's first axis is always the record axis: length 1 for a block
/// cut from a single record, `nrecords` after combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    /// Provenance for repositioning the data.
    pub key: GroupingKey,
    /// The block data, record axis first.
    pub data: ArrayD<T>,
}

impl<T> Block<T> {
    /// Creates a block.
    pub fn new(key: GroupingKey, data: ArrayD<T>) -> Self {
        Self { key, data }
    }

    /// The block's full shape, record axis first.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// A padded grouping key paired with its halo-padded block data.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBlock<T> {
    /// Provenance, including halo trim information.
    pub key: PaddedGroupingKey,
    /// The padded block data, record axis first.
    pub data: ArrayD<T>,
}

impl<T> PaddedBlock<T> {
    /// Creates a padded block.
    pub fn new(key: PaddedGroupingKey, data: ArrayD<T>) -> Self {
        Self { key, data }
    }
}

impl<T: Clone> PaddedBlock<T> {
    /// Strips the halo, returning exactly the core region.
    ///
    /// Uses the core sub-ranges recorded at extraction time, so the result
    /// matches the unpadded extraction bit for bit, including at array
    /// edges where the actual pad was smaller than requested.
    pub fn trim_to_core(&self) -> Block<T> {
        let info = slice_info(self.key.core_in_padded());
        let data = self.data.slice(info.as_slice()).to_owned();
        Block::new(self.key.core().clone(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn simple_key() -> GroupingKey {
        GroupingKey::new(
            vec![10, 12, 12],
            vec![
                AxisRange::new(3, 4),
                AxisRange::new(0, 6),
                AxisRange::new(6, 12),
            ],
        )
    }

    #[test]
    fn test_spatial_accessors() {
        let key = simple_key();
        assert_eq!(key.nrecords(), 10);
        assert_eq!(key.record_range(), AxisRange::new(3, 4));
        assert_eq!(key.spatial_shape(), vec![6, 6]);
        assert_eq!(
            key.coordinate(),
            BlockCoordinate(vec![AxisRange::new(0, 6), AxisRange::new(6, 12)])
        );
    }

    #[test]
    fn test_temporal_concatenation() {
        let key = simple_key().as_temporally_concatenated();
        assert_eq!(key.record_range(), AxisRange::new(0, 10));
        // spatial part untouched
        assert_eq!(key.spatial_shape(), vec![6, 6]);
    }

    #[test]
    fn test_keys_group_by_coordinate() {
        let a = simple_key();
        let mut ranges = a.ranges().to_vec();
        ranges[0] = AxisRange::new(7, 8);
        let b = GroupingKey::new(a.orig_shape().to_vec(), ranges);
        // different records, same spatial position
        assert_ne!(a, b);
        assert_eq!(a.coordinate(), b.coordinate());
    }

    #[test]
    fn test_trim_to_core() {
        // padded block 1x4 holding values 0..4, core is the middle 2
        let core = GroupingKey::new(
            vec![1, 8],
            vec![AxisRange::new(0, 1), AxisRange::new(3, 5)],
        );
        let key = PaddedGroupingKey::new(
            core.clone(),
            vec![AxisRange::new(0, 1), AxisRange::new(2, 6)],
            vec![1],
            vec![1, 4],
            vec![AxisRange::new(0, 1), AxisRange::new(1, 3)],
        );
        let data = ArrayD::from_shape_vec(IxDyn(&[1, 4]), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let trimmed = PaddedBlock::new(key, data).trim_to_core();
        assert_eq!(trimmed.key, core);
        assert_eq!(trimmed.data.shape(), &[1, 2]);
        assert_eq!(trimmed.data.as_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_display() {
        let s = simple_key().to_string();
        assert!(s.contains("0..6"));
        assert!(s.contains("6..12"));
    }
}
