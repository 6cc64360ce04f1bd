//! Error types that are reported by shape, tensor and expression operations.
//!
//! Most builders panic with the `Display` form of these errors, since a shape
//! mismatch in an expression is a programming error. The `try_` variants of
//! those builders return the error instead.

use std::error::Error;
use std::fmt::{Display, Formatter};

use smet_base::int_seq::IntSeq;

/// Errors that can occur when constructing or querying a [`Shape`](crate::Shape).
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeError {
    /// An axis occurs more than once.
    DuplicateAxis(String),

    /// An axis was required but is not part of the shape.
    MissingAxis(String),
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::DuplicateAxis(name) => write!(f, "axis {} occurs more than once", name),
            ShapeError::MissingAxis(name) => write!(f, "axis {} is not part of the shape", name),
        }
    }
}

impl Error for ShapeError {}

/// Error returned when an aligned buffer cannot be allocated.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocError {
    /// Requested size in bytes.
    pub bytes: usize,

    /// Requested alignment in bytes.
    pub align: usize,
}

impl Display for AllocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to allocate {} bytes with alignment {}",
            self.bytes, self.align
        )
    }
}

impl Error for AllocError {}

/// Errors that can occur when constructing a storage tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// The number of dynamic sizes does not match the number of dynamic axes
    /// in the shape.
    DynamicArity { expected: usize, actual: usize },

    /// The data length does not match the product of the axis sizes.
    DataLength { expected: usize, actual: usize },

    /// The buffer could not be allocated.
    Alloc(AllocError),
}

impl Display for TensorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorError::DynamicArity { expected, actual } => write!(
                f,
                "expected {} dynamic sizes but {} were given",
                expected, actual
            ),
            TensorError::DataLength { expected, actual } => write!(
                f,
                "data length {} does not match tensor length {}",
                actual, expected
            ),
            TensorError::Alloc(err) => write!(f, "{}", err),
        }
    }
}

impl Error for TensorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TensorError::Alloc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for TensorError {
    fn from(val: AllocError) -> TensorError {
        TensorError::Alloc(val)
    }
}

/// Errors that can occur when building or assigning an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprError {
    /// An axis (or its twin) was required but is not part of the expression's
    /// shape.
    MissingAxis(String),

    /// The expression cannot be the target of an assignment.
    NotAssignable,

    /// Two operands resolve a shared axis to different sizes.
    SizeMismatch {
        axis: String,
        left: usize,
        right: usize,
    },

    /// A bound index is out of range for the bound axis.
    IndexOutOfRange {
        axis: String,
        index: usize,
        size: usize,
    },
}

impl Display for ExprError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::MissingAxis(name) => {
                write!(f, "axis {} is not part of the expression", name)
            }
            ExprError::NotAssignable => write!(f, "expression is not assignable"),
            ExprError::SizeMismatch { axis, left, right } => write!(
                f,
                "axis {} has size {} in one operand and {} in another",
                axis, left, right
            ),
            ExprError::IndexOutOfRange { axis, index, size } => write!(
                f,
                "index {} is out of range for axis {} of size {}",
                index, axis, size
            ),
        }
    }
}

impl Error for ExprError {}

impl From<ShapeError> for ExprError {
    fn from(val: ShapeError) -> ExprError {
        match val {
            ShapeError::DuplicateAxis(name) | ShapeError::MissingAxis(name) => {
                ExprError::MissingAxis(name)
            }
        }
    }
}

/// Errors that can occur when requesting a merged view of an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeError {
    /// The cut points are not strictly increasing from 0 to the axis count.
    InvalidCuts { cuts: IntSeq, len: usize },

    /// The cut points would merge axes which the expression cannot merge.
    NotSuperset { cuts: IntSeq, required: IntSeq },
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::InvalidCuts { cuts, len } => {
                write!(f, "cuts {:?} are not valid for {} axes", cuts, len)
            }
            MergeError::NotSuperset { cuts, required } => write!(
                f,
                "cuts {:?} do not include the required cuts {:?}",
                cuts, required
            ),
        }
    }
}

impl Error for MergeError {}
