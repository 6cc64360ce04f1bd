use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::scalar::ScalarNode;
use super::{Expr, Indices, Node};
use crate::axis::Axis;
use crate::errors::ExprError;
use crate::indexer::Dims;
use crate::merge::{child_cuts, mergeable_cuts, skip_position, OperandCuts};
use crate::shape::Shape;

/// Expression which fixes one axis of its child to a constant index.
pub struct BindNode<'a, T> {
    child: Expr<'a, T>,
    axis: Axis,

    /// Position of the bound axis in the child's shape.
    pos: usize,

    index: usize,
    shape: Shape,
    dims: Dims,
}

impl<'a, T: Element> BindNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    /// Return the bound axis, as it appears in the child's shape.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn borrowed(&self) -> BindNode<'_, T> {
        BindNode {
            child: self.child.borrowed(),
            axis: self.axis.clone(),
            pos: self.pos,
            index: self.index,
            shape: self.shape.clone(),
            dims: self.dims.clone(),
        }
    }

    fn child_indices(&self, indices: &[usize]) -> Indices {
        let mut child_indices = Indices::from_slice(indices);
        child_indices.insert(self.pos, self.index);
        child_indices
    }
}

impl<'a, T: Element> Node<'a, T> for BindNode<'a, T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn is_assignable(&self) -> bool {
        self.child.is_assignable()
    }

    fn mergeable_comps(&self) -> IntSeq {
        let positions = skip_position(self.shape.len(), self.pos);
        let child = OperandCuts {
            positions: &positions,
            cuts: self.child.mergeable_comps(),
        };
        mergeable_cuts(self.shape.len(), &[child], &[])
    }

    fn eval(&self, indices: &[usize]) -> T {
        self.child.eval(&self.child_indices(indices))
    }

    fn place(&self, indices: &[usize]) -> *mut T {
        self.child.place(&self.child_indices(indices))
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        self.child.is_aliasing(ptr)
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        let positions = skip_position(self.shape.len(), self.pos);
        let child_cuts = child_cuts(cuts, &positions, self.shape.len() + 1, &[self.pos]);
        let child = self.child.merged_view(&child_cuts);
        bind(child, &self.axis, self.index)
    }
}

/// Fix `axis` of `expr` to `index`, removing it from the shape.
///
/// If `expr` does not have `axis` but has its twin, the twin is bound
/// instead. Binding the only axis of an expression returns a scalar: a
/// reference to the element if `expr` is assignable, or its value otherwise.
///
/// Panics if neither `axis` nor its twin is part of the shape, or if `index`
/// is out of range.
///
/// ```
/// use smet::{bind, Axis, Shape, Tensor};
///
/// const I: Axis = Axis::new("i", 2);
/// const J: Axis = Axis::new("j", 3);
///
/// let tensor = Tensor::from_data(Shape::from([I, J]), &[], &[1, 2, 3, 4, 5, 6]);
/// let row = bind(tensor.view(), &I, 1);
/// assert_eq!(row.shape(), &Shape::from([J]));
/// assert_eq!(row.eval(&[2]), 6);
/// ```
pub fn bind<'a, T: Element>(expr: Expr<'a, T>, axis: &Axis, index: usize) -> Expr<'a, T> {
    match try_bind(expr, axis, index) {
        Ok(bound) => bound,
        Err(err) => panic!("{}", err),
    }
}

/// Variant of [`bind`] which returns an error instead of panicking.
pub fn try_bind<'a, T: Element>(
    expr: Expr<'a, T>,
    axis: &Axis,
    index: usize,
) -> Result<Expr<'a, T>, ExprError> {
    let axis = expr
        .shape()
        .resolve_or_twin(axis)
        .ok_or_else(|| ExprError::MissingAxis(axis.to_string()))?;
    let pos = expr.shape().position_of(&axis);
    let size = expr.dims()[pos];
    if index >= size {
        return Err(ExprError::IndexOutOfRange {
            axis: axis.to_string(),
            index,
            size,
        });
    }

    if expr.shape().len() == 1 {
        let node = if expr.is_assignable() {
            // Safety: `place` returns a pointer into storage that `expr`
            // borrows mutably for `'a`, and `expr` is consumed here.
            unsafe { ScalarNode::from_place(expr.place(&[index])) }
        } else {
            ScalarNode::Value(expr.eval(&[index]))
        };
        return Ok(Expr::Scalar(node));
    }

    let shape = expr.shape().without(&axis);
    let mut dims = Dims::from_slice(expr.dims());
    dims.remove(pos);

    Ok(Expr::Bind(Box::new(BindNode {
        child: expr,
        axis,
        pos,
        index,
        shape,
        dims,
    })))
}
