use std::marker::PhantomData;
use std::ptr::NonNull;

use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::{Expr, Node};
use crate::indexer::{offset, Dims};
use crate::merge::merged_dims;
use crate::shape::Shape;

/// Leaf expression which views the buffer of a storage tensor.
///
/// The buffer is laid out contiguously in row-major order over the view's
/// shape, so every run of axes is mergeable.
pub struct StorageView<'a, T> {
    ptr: NonNull<T>,
    shape: Shape,
    dims: Dims,

    /// True if the view was created from a mutable borrow and can be
    /// assigned to.
    writable: bool,

    _marker: PhantomData<&'a T>,
}

// Safety: A writable view is created from a mutable borrow of its tensor and
// is only written through by `assign`, which owns the view and writes disjoint
// elements from each thread. Read-only views behave like `&[T]`.
unsafe impl<T: Send + Sync> Send for StorageView<'_, T> {}
unsafe impl<T: Send + Sync> Sync for StorageView<'_, T> {}

impl<'a, T> StorageView<'a, T> {
    /// Create a view of the `dims.iter().product()` elements starting at
    /// `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads for lifetime `'a`, and for writes if
    /// `writable` is true. If `writable` is true, no other view may access
    /// the buffer for `'a`.
    pub(crate) unsafe fn from_raw_parts(
        ptr: NonNull<T>,
        shape: Shape,
        dims: Dims,
        writable: bool,
    ) -> StorageView<'a, T> {
        StorageView {
            ptr,
            shape,
            dims,
            writable,
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub(crate) fn read_only(&self) -> StorageView<'_, T> {
        StorageView {
            ptr: self.ptr,
            shape: self.shape.clone(),
            dims: self.dims.clone(),
            writable: false,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Element> Node<'a, T> for StorageView<'a, T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn is_storing(&self) -> bool {
        true
    }

    fn is_assignable(&self) -> bool {
        self.writable
    }

    fn mergeable_comps(&self) -> IntSeq {
        let mut cuts = IntSeq::from([0]);
        cuts.insert_ordered(self.shape.len(), 0, true);
        cuts
    }

    #[inline]
    fn eval(&self, indices: &[usize]) -> T {
        let offset = offset(&self.dims, indices);
        // Safety: `offset` checked that the indices are in range.
        unsafe { *self.ptr.as_ptr().add(offset) }
    }

    #[inline]
    fn place(&self, indices: &[usize]) -> *mut T {
        let offset = offset(&self.dims, indices);
        // Safety: `offset` checked that the indices are in range.
        unsafe { self.ptr.as_ptr().add(offset) }
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        std::ptr::eq(self.ptr.as_ptr(), ptr)
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        Expr::Storage(StorageView {
            ptr: self.ptr,
            shape: self.shape.merged(cuts),
            dims: merged_dims(&self.dims, cuts),
            writable: self.writable,
            _marker: PhantomData,
        })
    }
}
