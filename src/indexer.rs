//! Conversion of per-axis indices into storage offsets.

use smallvec::SmallVec;

use crate::axis::AxisSize;
use crate::shape::Shape;

/// Concrete sizes of each axis of a shape.
pub type Dims = SmallVec<[usize; 4]>;

/// Return the size of each axis of `shape`, taking the sizes of dynamic axes
/// from `dyn_sizes` in order.
///
/// Panics if `dyn_sizes` does not have one entry per dynamic axis.
pub fn resolve_dims(shape: &Shape, dyn_sizes: &[usize]) -> Dims {
    assert_eq!(
        dyn_sizes.len(),
        shape.n_dynamic(),
        "expected {} dynamic sizes for shape {} but {} were given",
        shape.n_dynamic(),
        shape,
        dyn_sizes.len()
    );
    let mut dyn_iter = dyn_sizes.iter();
    shape
        .iter()
        .map(|axis| match axis.size() {
            AxisSize::Fixed(n) => n,
            AxisSize::Dynamic => dyn_iter.next().copied().unwrap_or(0),
        })
        .collect()
}

/// Return the linear offset of `indices` in a row-major array with sizes
/// `dims`, or `None` if an index is out of range.
///
/// The offset is accumulated from the last axis backward, each axis
/// contributing `index * (product of the sizes after it)`.
///
/// Panics if the number of indices does not match the number of dims.
#[inline]
pub fn try_offset(dims: &[usize], indices: &[usize]) -> Option<usize> {
    assert_eq!(
        dims.len(),
        indices.len(),
        "expected {} indices but {} were given",
        dims.len(),
        indices.len()
    );
    let mut offset = 0;
    let mut stride = 1;
    for (&index, &size) in indices.iter().zip(dims).rev() {
        if index >= size {
            return None;
        }
        offset += index * stride;
        stride *= size;
    }
    Some(offset)
}

/// Variant of [`try_offset`] which panics if an index is out of range.
#[inline]
pub fn offset(dims: &[usize], indices: &[usize]) -> usize {
    try_offset(dims, indices).unwrap_or_else(|| {
        panic!(
            "indices {:?} are out of range for dims {:?}",
            indices, dims
        )
    })
}

/// Return the storage offset of `indices` in a tensor with shape `shape`
/// whose dynamic axes have sizes `dyn_sizes`.
///
/// ```
/// use smet::{index, Axis, Shape};
///
/// let shape = Shape::from([Axis::new("i", 3), Axis::new("j", 4)]);
/// assert_eq!(index(&shape, &[], &[2, 1]), 9);
/// ```
///
/// Panics if the index count does not match the axis count, or if an index
/// is out of range for its axis.
pub fn index(shape: &Shape, dyn_sizes: &[usize], indices: &[usize]) -> usize {
    let dims = resolve_dims(shape, dyn_sizes);
    if let Some(offset) = try_offset(&dims, indices) {
        return offset;
    }
    for ((axis, &index), &size) in shape.iter().zip(indices).zip(&dims) {
        assert!(
            index < size,
            "index {} is out of range for axis {} of size {}",
            index,
            axis,
            size
        );
    }
    unreachable!("offset of in-range indices {:?}", indices)
}

/// Variant of [`index`] which returns `None` if an index is out of range.
pub fn try_index(shape: &Shape, dyn_sizes: &[usize], indices: &[usize]) -> Option<usize> {
    try_offset(&resolve_dims(shape, dyn_sizes), indices)
}

/// Advance `indices` to the next index tuple of an array with sizes `dims`,
/// in row-major order.
///
/// Returns false, with every index reset to zero, after the last tuple.
#[inline]
pub fn next_index(indices: &mut [usize], dims: &[usize]) -> bool {
    for (index, &size) in indices.iter_mut().zip(dims).rev() {
        *index += 1;
        if *index < size {
            return true;
        }
        *index = 0;
    }
    false
}
