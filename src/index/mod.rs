//! Column-major linear index arithmetic.
//!
//! Converts between N-dimensional coordinates and a single linear index
//! under column-major (Fortran) ordering, where the first axis varies
//! fastest. The series strategy assigns voxels to blocks by binary search
//! over these linear indices.

use crate::error::BlockError;

/// Returns the column-major stride for each axis of `dims`.
///
/// `strides[0] == 1`; each later stride is the product of all earlier
/// extents.
pub fn column_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(dims.len());
    let mut acc = 1usize;
    for &d in dims {
        strides.push(acc);
        acc *= d;
    }
    strides
}

/// Converts an N-d coordinate to its column-major linear index.
///
/// # Errors
///
/// Returns [`BlockError::DimensionalityMismatch`] if `coord` and `dims`
/// have different lengths, or [`BlockError::IndexOutOfRange`] if any
/// coordinate is outside its axis extent.
///
/// # Example
///
/// ```
/// use blockrs::index::sub_to_ind;
///
/// // first axis fastest: (1, 0, 0) -> 1, (0, 1, 0) -> 5
/// assert_eq!(sub_to_ind(&[1, 0, 0], &[5, 10, 3])?, 1);
/// assert_eq!(sub_to_ind(&[0, 1, 0], &[5, 10, 3])?, 5);
/// # Ok::<(), blockrs::BlockError>(())
/// ```
pub fn sub_to_ind(coord: &[usize], dims: &[usize]) -> Result<usize, BlockError> {
    if coord.len() != dims.len() {
        return Err(BlockError::DimensionalityMismatch {
            expected: dims.len(),
            actual: coord.len(),
        });
    }
    let mut linear = 0usize;
    let mut stride = 1usize;
    for (&c, &d) in coord.iter().zip(dims) {
        if c >= d {
            return Err(BlockError::IndexOutOfRange {
                index: c,
                max: d.saturating_sub(1),
            });
        }
        linear += c * stride;
        stride *= d;
    }
    Ok(linear)
}

/// Converts a column-major linear index back to an N-d coordinate.
///
/// # Errors
///
/// Returns [`BlockError::IndexOutOfRange`] if `linear` is not less than
/// the total element count of `dims`.
pub fn ind_to_sub(linear: usize, dims: &[usize]) -> Result<Vec<usize>, BlockError> {
    let total: usize = dims.iter().product();
    if linear >= total {
        return Err(BlockError::IndexOutOfRange {
            index: linear,
            max: total.saturating_sub(1),
        });
    }
    let mut rem = linear;
    let mut coord = Vec::with_capacity(dims.len());
    for &d in dims {
        coord.push(rem % d);
        rem /= d;
    }
    Ok(coord)
}
