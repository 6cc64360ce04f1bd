//! Storage tensors, which own the elements that expressions read and write.

use std::fmt;

use smallvec::SmallVec;
use smet_base::num::Element;

use crate::alloc::{AlignedBuf, Alloc, GlobalAlloc, DEFAULT_ALIGN};
use crate::assign::assign;
use crate::errors::TensorError;
use crate::expr::{Expr, StorageView};
use crate::indexer::{index, next_index, resolve_dims, try_offset, Dims};
use crate::shape::Shape;

/// Sizes of the dynamic axes of a tensor, in shape order.
pub type DynSizes = SmallVec<[usize; 2]>;

/// A tensor which owns its elements.
///
/// Elements are stored contiguously in row-major order over the shape, in
/// one buffer aligned to [`DEFAULT_ALIGN`] bytes. The size of each dynamic
/// axis is given when the tensor is created.
///
/// Tensors are read and written through expressions. [`view`](Tensor::view)
/// returns a read-only expression over the tensor and
/// [`view_mut`](Tensor::view_mut) one which can be the destination of an
/// [`assign`].
///
/// ```
/// use smet::{add, scalar, Axis, Shape, Tensor};
///
/// const ROW: Axis = Axis::new("row", 2);
/// const SITE: Axis = Axis::dynamic("site");
///
/// let mut t = Tensor::<f32>::new(Shape::from([ROW, SITE]), &[3]);
/// assert_eq!(t.dims(), &[2, 3]);
///
/// t.fill(1.);
/// t.update(|x| add(x, scalar(2.)));
/// assert!(t.data().iter().all(|&x| x == 3.));
/// ```
pub struct Tensor<T> {
    shape: Shape,
    dyn_sizes: DynSizes,
    dims: Dims,
    buf: AlignedBuf<T>,
}

impl<T: Element> Tensor<T> {
    /// Create a tensor with all elements set to zero.
    ///
    /// `dyn_sizes` gives the size of each dynamic axis of `shape`, in order.
    /// Panics if the number of dynamic sizes is wrong or the buffer cannot be
    /// allocated.
    pub fn new(shape: Shape, dyn_sizes: &[usize]) -> Tensor<T> {
        match Self::try_new(shape, dyn_sizes) {
            Ok(tensor) => tensor,
            Err(err) => panic!("{}", err),
        }
    }

    /// Variant of [`new`](Tensor::new) which returns an error.
    pub fn try_new(shape: Shape, dyn_sizes: &[usize]) -> Result<Tensor<T>, TensorError> {
        Self::try_new_in(GlobalAlloc::new(), shape, dyn_sizes)
    }

    /// Variant of [`try_new`](Tensor::try_new) which takes an allocator.
    pub fn try_new_in<A: Alloc>(
        alloc: A,
        shape: Shape,
        dyn_sizes: &[usize],
    ) -> Result<Tensor<T>, TensorError> {
        let dims = check_dyn_sizes(&shape, dyn_sizes)?;
        let len = dims.iter().product();
        let buf = alloc.alloc_aligned(len, DEFAULT_ALIGN)?;
        Ok(Tensor {
            shape,
            dyn_sizes: DynSizes::from_slice(dyn_sizes),
            dims,
            buf,
        })
    }

    /// Create a tensor with all elements set to `value`.
    pub fn full(shape: Shape, dyn_sizes: &[usize], value: T) -> Tensor<T> {
        let mut tensor = Self::new(shape, dyn_sizes);
        tensor.fill(value);
        tensor
    }

    /// Create a tensor from elements in row-major order.
    ///
    /// Panics if the number of dynamic sizes is wrong or `data` does not have
    /// one element per index tuple.
    pub fn from_data(shape: Shape, dyn_sizes: &[usize], data: &[T]) -> Tensor<T> {
        match Self::try_from_data(shape, dyn_sizes, data) {
            Ok(tensor) => tensor,
            Err(err) => panic!("{}", err),
        }
    }

    /// Variant of [`from_data`](Tensor::from_data) which returns an error.
    pub fn try_from_data(
        shape: Shape,
        dyn_sizes: &[usize],
        data: &[T],
    ) -> Result<Tensor<T>, TensorError> {
        let dims = check_dyn_sizes(&shape, dyn_sizes)?;
        let len: usize = dims.iter().product();
        if data.len() != len {
            return Err(TensorError::DataLength {
                expected: len,
                actual: data.len(),
            });
        }
        let buf = AlignedBuf::from_slice(data, DEFAULT_ALIGN)?;
        Ok(Tensor {
            shape,
            dyn_sizes: DynSizes::from_slice(dyn_sizes),
            dims,
            buf,
        })
    }

    /// Create a tensor whose elements are `f(indices)`.
    ///
    /// `f` is called once per index tuple, in row-major order.
    pub fn from_fn<F: FnMut(&[usize]) -> T>(
        shape: Shape,
        dyn_sizes: &[usize],
        mut f: F,
    ) -> Tensor<T> {
        let mut tensor = Self::new(shape, dyn_sizes);
        let mut indices: SmallVec<[usize; 4]> = SmallVec::from_elem(0, tensor.dims.len());
        let dims = tensor.dims.clone();
        for x in tensor.buf.as_mut_slice() {
            *x = f(&indices);
            next_index(&mut indices, &dims);
        }
        tensor
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Return the size of each axis.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Return the sizes of the dynamic axes.
    pub fn dyn_sizes(&self) -> &[usize] {
        &self.dyn_sizes
    }

    /// Return the number of elements.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Return the elements in row-major order.
    pub fn data(&self) -> &[T] {
        self.buf.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }

    /// Return a pointer to the start of the buffer.
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Return the element at `indices`.
    ///
    /// Panics if the index count is wrong or an index is out of range.
    pub fn get(&self, indices: &[usize]) -> &T {
        &self.data()[index(&self.shape, &self.dyn_sizes, indices)]
    }

    /// Return the element at `indices`, or `None` if an index is out of
    /// range.
    pub fn try_get(&self, indices: &[usize]) -> Option<&T> {
        try_offset(&self.dims, indices).map(|offset| &self.data()[offset])
    }

    pub fn get_mut(&mut self, indices: &[usize]) -> &mut T {
        let offset = index(&self.shape, &self.dyn_sizes, indices);
        &mut self.data_mut()[offset]
    }

    /// Return true if `ptr` is the start of this tensor's buffer.
    pub fn is_aliasing(&self, ptr: *const T) -> bool {
        std::ptr::eq(self.as_ptr(), ptr)
    }

    /// Return a read-only expression over this tensor.
    pub fn view(&self) -> Expr<'_, T> {
        // Safety: The view is read-only and borrows `self`.
        unsafe { self.raw_view(false) }
    }

    /// Return an expression over this tensor which can be assigned to.
    pub fn view_mut(&mut self) -> Expr<'_, T> {
        // Safety: The view borrows `self` mutably.
        unsafe { self.raw_view(true) }
    }

    /// # Safety
    ///
    /// If `writable` is true, nothing else may access the buffer while the
    /// view exists.
    unsafe fn raw_view(&self, writable: bool) -> Expr<'_, T> {
        let view = unsafe {
            StorageView::from_raw_parts(
                self.buf.as_non_null(),
                self.shape.clone(),
                self.dims.clone(),
                writable,
            )
        };
        Expr::Storage(view)
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data_mut().fill(value);
    }

    /// Assign `src` to this tensor.
    ///
    /// This is `assign(self.view_mut(), src)`.
    pub fn assign_from(&mut self, src: Expr<'_, T>) {
        assign(self.view_mut(), src);
    }

    /// Replace the contents of this tensor with an expression built from a
    /// read-only view of it, ie. `A = f(A)`.
    ///
    /// If the expression reads from this tensor, it is first evaluated into a
    /// temporary tensor, so that no element is overwritten before every
    /// element that depends on it has been read.
    pub fn update<'s, F>(&'s mut self, f: F)
    where
        F: FnOnce(Expr<'s, T>) -> Expr<'s, T>,
    {
        let this: &'s Tensor<T> = self;
        let src = f(this.view());
        if src.is_aliasing(this.as_ptr()) {
            tracing::debug!(shape = %this.shape, "evaluating aliased update into a temporary");
            let tmp = src.to_tensor();
            drop(src);
            // Safety: `self` is borrowed mutably and `src`, the only other
            // view of it, has been dropped.
            assign(unsafe { this.raw_view(true) }, tmp.view());
        } else {
            // Safety: `self` is borrowed mutably and `src` does not read from
            // it.
            assign(unsafe { this.raw_view(true) }, src);
        }
    }
}

/// Check that `dyn_sizes` has one entry per dynamic axis of `shape` and
/// return the size of each axis.
fn check_dyn_sizes(shape: &Shape, dyn_sizes: &[usize]) -> Result<Dims, TensorError> {
    if dyn_sizes.len() != shape.n_dynamic() {
        return Err(TensorError::DynamicArity {
            expected: shape.n_dynamic(),
            actual: dyn_sizes.len(),
        });
    }
    Ok(resolve_dims(shape, dyn_sizes))
}

impl<T: Element> Clone for Tensor<T> {
    fn clone(&self) -> Tensor<T> {
        Tensor {
            shape: self.shape.clone(),
            dyn_sizes: self.dyn_sizes.clone(),
            dims: self.dims.clone(),
            buf: self.buf.clone(),
        }
    }
}

impl<T: Element> PartialEq for Tensor<T> {
    fn eq(&self, other: &Tensor<T>) -> bool {
        self.shape == other.shape && self.dims == other.dims && self.data() == other.data()
    }
}

impl<T: Element> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dims", &self.dims.as_slice())
            .field("data", &self.data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use smet_testing::{index_tuples, TestCases};

    use super::Tensor;
    use crate::alloc::DEFAULT_ALIGN;
    use crate::axis::Axis;
    use crate::errors::TensorError;
    use crate::expr::{add, neg, scalar, transpose, ExprKind};
    use crate::shape::Shape;

    const I: Axis = Axis::new("i", 2);
    const J: Axis = Axis::new("j", 3);
    const RW: Axis = Axis::row("s", 2);
    const CN: Axis = Axis::col("s", 2);
    const SITE: Axis = Axis::dynamic("site");

    #[test]
    fn test_new() {
        #[derive(Debug)]
        struct Case {
            shape: Shape,
            dyn_sizes: Vec<usize>,
            dims: Vec<usize>,
        }

        let cases = [
            Case {
                shape: Shape::from([I, J]),
                dyn_sizes: vec![],
                dims: vec![2, 3],
            },
            Case {
                shape: Shape::from([SITE, J]),
                dyn_sizes: vec![5],
                dims: vec![5, 3],
            },
            Case {
                shape: Shape::from([SITE]),
                dyn_sizes: vec![0],
                dims: vec![0],
            },
            Case {
                shape: Shape::empty(),
                dyn_sizes: vec![],
                dims: vec![],
            },
        ];

        cases.test_each(|case| {
            let t = Tensor::<f64>::new(case.shape.clone(), &case.dyn_sizes);
            assert_eq!(t.dims(), case.dims.as_slice());
            assert_eq!(t.len(), case.dims.iter().product::<usize>());
            assert_eq!(t.as_ptr() as usize % DEFAULT_ALIGN, 0);
            assert!(t.data().iter().all(|&x| x == 0.));
        })
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Tensor::<f32>::try_new(Shape::from([SITE]), &[]).err(),
            Some(TensorError::DynamicArity {
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(
            Tensor::try_from_data(Shape::from([I]), &[], &[1, 2, 3]).err(),
            Some(TensorError::DataLength {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    #[should_panic(expected = "expected 1 dynamic sizes but 2 were given")]
    fn test_new_panics() {
        Tensor::<f32>::new(Shape::from([SITE]), &[1, 2]);
    }

    #[test]
    fn test_get() {
        let mut t = Tensor::from_fn(Shape::from([I, J]), &[], |idx| {
            (idx[0] * 10 + idx[1]) as i32
        });
        assert_eq!(t.data(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(*t.get(&[1, 2]), 12);
        assert_eq!(t.try_get(&[2, 0]), None);
        *t.get_mut(&[0, 1]) = 5;
        assert_eq!(t.data()[1], 5);
    }

    #[test]
    #[should_panic(expected = "index 3 is out of range for axis j of size 3")]
    fn test_get_out_of_range() {
        let t = Tensor::<i32>::new(Shape::from([I, J]), &[]);
        t.get(&[0, 3]);
    }

    #[test]
    fn test_clone_is_deep() {
        let t = Tensor::from_data(Shape::from([I]), &[], &[1., 2.]);
        let mut copy = t.clone();
        assert_eq!(copy, t);
        assert!(!copy.is_aliasing(t.as_ptr()));
        copy.fill(0.);
        assert_eq!(t.data(), &[1., 2.]);
    }

    #[test]
    fn test_views() {
        let mut t = Tensor::<f32>::new(Shape::from([I, J]), &[]);
        {
            let view = t.view();
            assert_eq!(view.kind(), ExprKind::Storage);
            assert!(view.is_storing());
            assert!(!view.is_assignable());
            assert!(view.is_aliasing(t.as_ptr()));
        }
        assert!(t.view_mut().is_assignable());
    }

    #[test]
    fn test_assign_from() {
        let src = Tensor::from_fn(Shape::from([J, I]), &[], |idx| (idx[0] * 2 + idx[1]) as i32);
        let mut dest = Tensor::<i32>::new(Shape::from([I, J]), &[]);
        dest.assign_from(neg(src.view()));
        for idx in index_tuples(&[2, 3]) {
            assert_eq!(*dest.get(&idx), -src.get(&[idx[1], idx[0]]));
        }
    }

    #[test]
    fn test_update_aliased() {
        let mut t = Tensor::from_data(Shape::from([RW, CN]), &[], &[1, 2, 3, 4]);
        t.update(|m| add(m, scalar(10)));
        assert_eq!(t.data(), &[11, 12, 13, 14]);

        // A = A^T reads elements that are overwritten, so it needs a
        // temporary.
        t.update(transpose);
        assert_eq!(t.data(), &[11, 13, 12, 14]);
    }

    #[test]
    fn test_update_not_aliased() {
        let mut t = Tensor::from_data(Shape::from([I]), &[], &[1, 2]);
        t.update(|_| scalar(7));
        assert_eq!(t.data(), &[7, 7]);
    }
}
