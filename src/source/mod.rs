//! Source-array abstraction - the boundary to the execution substrate.
//!
//! A blocking plan is bound against anything implementing [`BlockSource`]:
//! the trait exposes only the shape information planning needs (spatial
//! dimensions, record count, element byte-size). The actual record data
//! flows through the blocking and combining functions, not through the
//! source.
//!
//! Two in-memory implementations are provided: [`SourceDesc`], a bare
//! shape descriptor, and [`ImageStack`], a uniformly-shaped stack of
//! arrays convenient for tests and demos.

use std::marker::PhantomData;

use ndarray::ArrayD;

use crate::error::BlockError;
use crate::strategy::ImageRecord;

/// Shape information a blocking plan is validated and bound against.
pub trait BlockSource {
    /// The array element type, used only for byte-budget arithmetic.
    type Elem;

    /// Spatial extent along each axis (record axis excluded).
    fn dims(&self) -> Vec<usize>;

    /// Number of records (time points, or per-voxel value count).
    fn nrecords(&self) -> usize;

    /// Byte size of one element.
    fn elem_size(&self) -> usize {
        std::mem::size_of::<Self::Elem>()
    }
}

/// A shape-only source descriptor.
///
/// Useful when the data lives in an external substrate and only its shape
/// is known locally.
///
/// # Example
///
/// ```
/// use blockrs::{BlockSource, SourceDesc};
///
/// let source: SourceDesc<u16> = SourceDesc::new(vec![5, 10, 3], 20);
/// assert_eq!(source.dims(), vec![5, 10, 3]);
/// assert_eq!(source.nrecords(), 20);
/// assert_eq!(source.elem_size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SourceDesc<T> {
    dims: Vec<usize>,
    nrecords: usize,
    _elem: PhantomData<T>,
}

impl<T> SourceDesc<T> {
    /// Creates a descriptor from spatial dims and a record count.
    pub fn new(dims: Vec<usize>, nrecords: usize) -> Self {
        Self {
            dims,
            nrecords,
            _elem: PhantomData,
        }
    }
}

impl<T> BlockSource for SourceDesc<T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        self.dims.clone()
    }

    fn nrecords(&self) -> usize {
        self.nrecords
    }
}

/// An in-memory stack of uniformly-shaped array records.
///
/// Record `i` is the full spatial array observed at time point `i`.
#[derive(Debug, Clone)]
pub struct ImageStack<T> {
    records: Vec<ArrayD<T>>,
}

impl<T> ImageStack<T> {
    /// Creates a stack from records, validating that shapes are uniform.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::EmptyGroup`] for an empty stack and
    /// [`BlockError::ShapeMismatch`] if any record's shape differs from
    /// the first.
    pub fn new(records: Vec<ArrayD<T>>) -> Result<Self, BlockError> {
        let first = records.first().ok_or(BlockError::EmptyGroup)?;
        let shape = first.shape().to_vec();
        for rec in &records[1..] {
            if rec.shape() != shape {
                return Err(BlockError::ShapeMismatch {
                    expected: shape,
                    actual: rec.shape().to_vec(),
                });
            }
        }
        Ok(Self { records })
    }

    /// The records as indexed [`ImageRecord`]s, ready for a blocking
    /// function.
    pub fn records(&self) -> impl Iterator<Item = ImageRecord<T>> + '_
    where
        T: Clone,
    {
        self.records
            .iter()
            .enumerate()
            .map(|(index, image)| ImageRecord::new(index, image.clone()))
    }

    /// Borrow record `i`.
    pub fn get(&self, i: usize) -> Option<&ArrayD<T>> {
        self.records.get(i)
    }
}

impl<T> BlockSource for ImageStack<T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        self.records[0].shape().to_vec()
    }

    fn nrecords(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_source_desc() {
        let source: SourceDesc<f64> = SourceDesc::new(vec![4, 4], 3);
        assert_eq!(source.dims(), vec![4, 4]);
        assert_eq!(source.nrecords(), 3);
        assert_eq!(source.elem_size(), 8);
    }

    #[test]
    fn test_image_stack_uniform_shapes() {
        let records = vec![
            ArrayD::<f32>::zeros(IxDyn(&[4, 6])),
            ArrayD::<f32>::zeros(IxDyn(&[4, 6])),
        ];
        let stack = ImageStack::new(records).unwrap();
        assert_eq!(stack.dims(), vec![4, 6]);
        assert_eq!(stack.nrecords(), 2);
        assert_eq!(stack.records().count(), 2);
    }

    #[test]
    fn test_image_stack_rejects_ragged() {
        let records = vec![
            ArrayD::<f32>::zeros(IxDyn(&[4, 6])),
            ArrayD::<f32>::zeros(IxDyn(&[4, 7])),
        ];
        assert!(matches!(
            ImageStack::new(records).unwrap_err(),
            BlockError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_image_stack_rejects_empty() {
        assert!(ImageStack::<f32>::new(vec![]).is_err());
    }
}
