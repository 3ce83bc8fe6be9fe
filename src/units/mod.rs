//! Units-per-dimension specifications.
//!
//! A blocking plan is parameterized by one value per spatial axis, in one
//! of two mutually exclusive interpretations:
//!
//! - [`Units::Splits`] - divide axis `i` into `values[i]` pieces
//! - [`Units::Pixels`] - each block spans `values[i]` pixels along axis
//!   `i`, except possibly the last
//!
//! Values are validated to be positive at construction; validation against
//! a concrete source shape (length match, split counts within the axis
//! extent) happens when a plan is bound.
//!
//! # Example
//!
//! ```
//! use blockrs::{UnitKind, Units};
//!
//! let by_splits = Units::splits(vec![2, 2])?;
//! let by_pixels = Units::pixels(vec![6, 6])?;
//! assert_eq!(by_pixels.kind(), UnitKind::Pixels);
//!
//! // string-keyed configuration surface, prefix matched
//! let parsed = Units::parse("spl", vec![2, 2])?;
//! assert_eq!(parsed, by_splits);
//! # Ok::<(), blockrs::BlockError>(())
//! ```

use crate::error::BlockError;
use crate::util::select_by_matching_prefix;

/// The interpretation of a units-per-dimension specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Each value is a block extent in pixels.
    Pixels,
    /// Each value is a number of partitions along the axis.
    Splits,
}

impl UnitKind {
    const VALID: [&'static str; 2] = ["pixels", "splits"];

    /// Selects a unit kind by (possibly abbreviated) name.
    ///
    /// Any unambiguous prefix of `"pixels"` or `"splits"` is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidUnits`] if the prefix matches no
    /// valid kind.
    pub fn select(prefix: &str) -> Result<Self, BlockError> {
        match select_by_matching_prefix(prefix, &Self::VALID)? {
            "pixels" => Ok(UnitKind::Pixels),
            _ => Ok(UnitKind::Splits),
        }
    }
}

/// A validated units-per-dimension specification.
///
/// Exactly one interpretation is active per plan; the two variants are
/// mutually exclusive representations of block granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Units {
    /// Divide axis `i` into `values[i]` roughly equal pieces.
    Splits(Vec<usize>),
    /// Blocks span `values[i]` pixels along axis `i` (last one truncated).
    Pixels(Vec<usize>),
}

impl Units {
    /// Creates a splits-per-dimension specification.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidUnits`] if any value is zero or the
    /// specification is empty.
    pub fn splits(values: Vec<usize>) -> Result<Self, BlockError> {
        normalize(&values)?;
        Ok(Units::Splits(values))
    }

    /// Creates a pixels-per-dimension specification.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidUnits`] if any value is zero or the
    /// specification is empty.
    pub fn pixels(values: Vec<usize>) -> Result<Self, BlockError> {
        normalize(&values)?;
        Ok(Units::Pixels(values))
    }

    /// Creates a specification from a string-keyed unit kind.
    ///
    /// The kind is prefix matched, so `"pix"` and `"s"` are accepted.
    pub fn parse(kind: &str, values: Vec<usize>) -> Result<Self, BlockError> {
        match UnitKind::select(kind)? {
            UnitKind::Pixels => Units::pixels(values),
            UnitKind::Splits => Units::splits(values),
        }
    }

    /// The unit kind of this specification.
    pub fn kind(&self) -> UnitKind {
        match self {
            Units::Pixels(_) => UnitKind::Pixels,
            Units::Splits(_) => UnitKind::Splits,
        }
    }

    /// The per-axis values.
    pub fn values(&self) -> &[usize] {
        match self {
            Units::Pixels(v) | Units::Splits(v) => v,
        }
    }

    /// Validates this specification against a concrete source shape.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::DimensionalityMismatch`] if the value count
    /// differs from `dims.len()`, or [`BlockError::ExcessiveSplit`] if a
    /// split count exceeds its axis extent.
    pub fn validate_for(&self, dims: &[usize]) -> Result<(), BlockError> {
        let values = self.values();
        if values.len() != dims.len() {
            return Err(BlockError::DimensionalityMismatch {
                expected: dims.len(),
                actual: values.len(),
            });
        }
        if let Units::Splits(splits) = self {
            for (axis, (&s, &d)) in splits.iter().zip(dims).enumerate() {
                if s > d {
                    return Err(BlockError::ExcessiveSplit {
                        axis,
                        splits: s,
                        extent: d,
                    });
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn normalize(values: &[usize]) -> Result<(), BlockError> {
    if values.is_empty() {
        return Err(BlockError::InvalidUnits {
            message: "specification must have at least one axis".into(),
        });
    }
    if values.contains(&0) {
        return Err(BlockError::InvalidUnits {
            message: format!("all unit values must be positive; got {:?}", values),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefix() {
        assert_eq!(UnitKind::select("pixels").unwrap(), UnitKind::Pixels);
        assert_eq!(UnitKind::select("p").unwrap(), UnitKind::Pixels);
        assert_eq!(UnitKind::select("spl").unwrap(), UnitKind::Splits);
        assert!(UnitKind::select("voxels").is_err());
    }

    #[test]
    fn test_zero_value_rejected() {
        assert!(Units::splits(vec![1, 0, 2]).is_err());
        assert!(Units::pixels(vec![0]).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(Units::splits(vec![]).is_err());
    }

    #[test]
    fn test_validate_length() {
        let units = Units::splits(vec![2, 2]).unwrap();
        let err = units.validate_for(&[12, 12, 3]).unwrap_err();
        assert!(matches!(
            err,
            BlockError::DimensionalityMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_validate_excessive_split() {
        let units = Units::splits(vec![2, 13]).unwrap();
        let err = units.validate_for(&[12, 12]).unwrap_err();
        assert!(matches!(err, BlockError::ExcessiveSplit { axis: 1, .. }));
    }

    #[test]
    fn test_pixels_may_exceed_extent() {
        // oversized pixel blocks just truncate; only splits are bounded
        let units = Units::pixels(vec![100, 100]).unwrap();
        assert!(units.validate_for(&[12, 12]).is_ok());
    }

    #[test]
    fn test_parse_kind() {
        let units = Units::parse("pix", vec![6, 6]).unwrap();
        assert_eq!(units.kind(), UnitKind::Pixels);
        assert_eq!(units.values(), &[6, 6]);
    }
}
