use std::marker::PhantomData;
use std::ptr::NonNull;

use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::{Expr, Node};
use crate::errors::ExprError;
use crate::shape::Shape;

static NO_AXES: Shape = Shape::empty();

/// Reference to a single element which can be assigned to.
pub struct PlacePtr<'a, T> {
    ptr: NonNull<T>,
    _marker: PhantomData<&'a mut T>,
}

// Safety: See `StorageView`.
unsafe impl<T: Send + Sync> Send for PlacePtr<'_, T> {}
unsafe impl<T: Send + Sync> Sync for PlacePtr<'_, T> {}

/// Zero-axis expression holding a single value, or referring to a single
/// element that it can be assigned through.
pub enum ScalarNode<'a, T> {
    Value(T),
    Place(PlacePtr<'a, T>),
}

impl<'a, T: Element> ScalarNode<'a, T> {
    /// Create a scalar which refers to `*ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes, and not accessed through any
    /// other path, for `'a`.
    pub(crate) unsafe fn from_place(ptr: *mut T) -> ScalarNode<'a, T> {
        match NonNull::new(ptr) {
            Some(ptr) => ScalarNode::Place(PlacePtr {
                ptr,
                _marker: PhantomData,
            }),
            None => panic!("scalar place is null"),
        }
    }

    /// Return the current value.
    pub fn value(&self) -> T {
        match self {
            ScalarNode::Value(v) => *v,
            // Safety: the place is valid for reads for `'a`.
            ScalarNode::Place(p) => unsafe { *p.ptr.as_ptr() },
        }
    }

    pub(crate) fn read_only(&self) -> ScalarNode<'_, T> {
        ScalarNode::Value(self.value())
    }
}

impl<'a, T: Element> Node<'a, T> for ScalarNode<'a, T> {
    fn shape(&self) -> &Shape {
        &NO_AXES
    }

    fn dims(&self) -> &[usize] {
        &[]
    }

    fn is_storing(&self) -> bool {
        true
    }

    fn is_assignable(&self) -> bool {
        matches!(self, ScalarNode::Place(_))
    }

    fn mergeable_comps(&self) -> IntSeq {
        IntSeq::from([0])
    }

    fn eval(&self, _indices: &[usize]) -> T {
        self.value()
    }

    fn place(&self, _indices: &[usize]) -> *mut T {
        match self {
            ScalarNode::Place(p) => p.ptr.as_ptr(),
            ScalarNode::Value(_) => panic!("{}", ExprError::NotAssignable),
        }
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        match self {
            ScalarNode::Place(p) => std::ptr::eq(p.ptr.as_ptr(), ptr),
            ScalarNode::Value(_) => false,
        }
    }

    fn merged_view(self, _cuts: &IntSeq) -> Expr<'a, T> {
        Expr::Scalar(self)
    }
}

/// Return a zero-axis expression with value `value`.
///
/// Scalar expressions can be combined with expressions of any shape, and
/// broadcast over all their axes.
pub fn scalar<'a, T: Element>(value: T) -> Expr<'a, T> {
    Expr::Scalar(ScalarNode::Value(value))
}

/// Return a zero-axis expression which reads and writes `*value`.
///
/// ```
/// use smet::{assign, scalar, scalar_mut};
///
/// let mut x = 1.0;
/// assign(scalar_mut(&mut x), scalar(2.5));
/// assert_eq!(x, 2.5);
/// ```
pub fn scalar_mut<T: Element>(value: &mut T) -> Expr<'_, T> {
    // Safety: The pointer comes from a mutable borrow which lasts as long as
    // the returned expression.
    Expr::Scalar(unsafe { ScalarNode::from_place(value) })
}

/// Promote a value into an expression.
///
/// Values become scalar expressions. Expressions, including scalars that are
/// already wrapped, are returned unchanged.
pub fn scalar_wrap<'a, T: Element>(value: impl Into<Expr<'a, T>>) -> Expr<'a, T> {
    value.into()
}
