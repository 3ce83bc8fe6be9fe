//! Error types for blockrs.

use std::fmt;

/// Errors that can occur while planning or applying a blocking strategy.
///
/// All variants are raised synchronously, either while validating a plan
/// against a source (`bind`) or inside a per-record blocking/combining call.
/// They indicate a caller configuration bug and are never retried or
/// downgraded internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// A units-per-dimension specification was malformed.
    InvalidUnits {
        /// Description of what was invalid.
        message: String,
    },

    /// A per-dimension specification's length does not match the source
    /// dimensionality.
    DimensionalityMismatch {
        /// The source's number of spatial axes.
        expected: usize,
        /// The length of the offending specification.
        actual: usize,
    },

    /// A requested split count exceeds the extent of its axis.
    ExcessiveSplit {
        /// The offending axis.
        axis: usize,
        /// The requested number of splits.
        splits: usize,
        /// The extent of the axis.
        extent: usize,
    },

    /// A series split configuration violates the monotonic-splitting
    /// constraint (at most one incompletely split axis, fully split axes
    /// after it, unsplit axes before it).
    InvalidSplitConfiguration {
        /// The requested splits per dimension.
        splits: Vec<usize>,
        /// The source dimensions.
        dims: Vec<usize>,
    },

    /// A padding specification was malformed.
    InvalidPadding {
        /// Description of what was invalid.
        message: String,
    },

    /// A coordinate or linear index fell outside the known range.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The largest valid index.
        max: usize,
    },

    /// An array or value vector did not have the shape the bound strategy
    /// expects.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The shape actually seen.
        actual: Vec<usize>,
    },

    /// A combining call received no blocks for its group.
    EmptyGroup,

    /// A memory-size string such as "256k" or "150M" could not be parsed.
    InvalidMemoryString {
        /// The input that failed to parse.
        input: String,
    },
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::InvalidUnits { message } => {
                write!(f, "invalid units: {}", message)
            }
            BlockError::DimensionalityMismatch { expected, actual } => {
                write!(
                    f,
                    "dimensionality mismatch: specification has length {} but source has {} axes",
                    actual, expected
                )
            }
            BlockError::ExcessiveSplit {
                axis,
                splits,
                extent,
            } => {
                write!(
                    f,
                    "excessive split: {} splits requested on axis {} of extent {}",
                    splits, axis, extent
                )
            }
            BlockError::InvalidSplitConfiguration { splits, dims } => {
                write!(
                    f,
                    "invalid split configuration {:?} for dimensions {:?}: only one axis may be \
                     incompletely split; later axes must be fully split and earlier axes unsplit",
                    splits, dims
                )
            }
            BlockError::InvalidPadding { message } => {
                write!(f, "invalid padding: {}", message)
            }
            BlockError::IndexOutOfRange { index, max } => {
                write!(f, "index {} out of range (max {})", index, max)
            }
            BlockError::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, actual)
            }
            BlockError::EmptyGroup => {
                write!(f, "combining function called with an empty group")
            }
            BlockError::InvalidMemoryString { input } => {
                write!(f, "could not parse memory string '{}'", input)
            }
        }
    }
}

impl std::error::Error for BlockError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_excessive_split() {
        let err = BlockError::ExcessiveSplit {
            axis: 1,
            splits: 9,
            extent: 4,
        };
        let s = err.to_string();
        assert!(s.contains("axis 1"));
        assert!(s.contains("9 splits"));
    }

    #[test]
    fn test_display_shape_mismatch() {
        let err = BlockError::ShapeMismatch {
            expected: vec![4, 4],
            actual: vec![4, 5],
        };
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn test_display_memory_string() {
        let err = BlockError::InvalidMemoryString {
            input: "12q".into(),
        };
        assert!(err.to_string().contains("12q"));
    }
}
