use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::{Expr, Node};
use crate::merge::{identity_positions, mergeable_cuts, OperandCuts};
use crate::shape::Shape;

/// Expression which replaces every axis of its child by its twin.
///
/// Indices are forwarded positionally, so the element at `indices` is the
/// child's element at the same `indices`, now labelled with the twinned axes.
pub struct TransposeNode<'a, T> {
    child: Expr<'a, T>,
    shape: Shape,
}

impl<'a, T: Element> TransposeNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    /// Consume the node and return its child.
    pub(crate) fn into_child(self) -> Expr<'a, T> {
        self.child
    }

    pub(crate) fn borrowed(&self) -> TransposeNode<'_, T> {
        TransposeNode {
            child: self.child.borrowed(),
            shape: self.shape.clone(),
        }
    }
}

impl<'a, T: Element> Node<'a, T> for TransposeNode<'a, T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn dims(&self) -> &[usize] {
        self.child.dims()
    }

    fn is_assignable(&self) -> bool {
        self.child.is_assignable()
    }

    fn mergeable_comps(&self) -> IntSeq {
        let n_axes = self.shape.len();
        let positions = identity_positions(n_axes);
        let child = OperandCuts {
            positions: &positions,
            cuts: self.child.mergeable_comps(),
        };
        mergeable_cuts(n_axes, &[child], &self.shape.true_twin_cuts())
    }

    fn eval(&self, indices: &[usize]) -> T {
        self.child.eval(indices)
    }

    fn place(&self, indices: &[usize]) -> *mut T {
        self.child.place(indices)
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        self.child.is_aliasing(ptr)
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        transpose(self.child.merged_view(cuts))
    }
}

/// Replace every axis of `expr` by its twin.
///
/// `transpose(transpose(x))` returns `x`, and an expression without any row
/// or column axes is returned unchanged.
///
/// ```
/// use smet::{transpose, Axis, Shape, Tensor};
///
/// const RW: Axis = Axis::row("spin", 2);
/// const CN: Axis = Axis::col("spin", 2);
///
/// let m = Tensor::from_data(Shape::from([RW, CN]), &[], &[1, 2, 3, 4]);
/// let t = transpose(m.view());
/// assert_eq!(t.shape(), &Shape::from([CN, RW]));
/// assert_eq!(t.eval(&[0, 1]), 2);
/// ```
pub fn transpose<T: Element>(expr: Expr<'_, T>) -> Expr<'_, T> {
    match expr {
        Expr::Transpose(node) => node.child,
        expr if !expr.shape().iter().any(|a| a.is_true_twin()) => expr,
        expr => {
            let shape = expr.shape().twinned();
            Expr::Transpose(Box::new(TransposeNode { child: expr, shape }))
        }
    }
}
