use std::sync::Arc;

use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::{Expr, Indices, Node};
use crate::axis::Axis;
use crate::errors::ExprError;
use crate::indexer::Dims;
use crate::merge::{child_cuts, mergeable_cuts, skip_position, OperandCuts};
use crate::shape::Shape;

/// Maps an index of the `bound_to` axis of a [`RelBindNode`] to the index of
/// its hidden `bound` axis.
pub type Adapter = Arc<dyn Fn(usize) -> usize + Send + Sync>;

/// Expression which hides one axis of its child, whose index is computed
/// from the index of another axis.
///
/// With the identity adapter and a pair of twin axes, this is the diagonal
/// of a matrix over that pair.
pub struct RelBindNode<'a, T> {
    child: Expr<'a, T>,
    bound: Axis,
    bound_to: Axis,

    /// Position of `bound` in the child's shape.
    bound_pos: usize,

    /// Position of `bound_to` in this node's shape.
    to_pos: usize,

    adapter: Adapter,
    shape: Shape,
    dims: Dims,
}

impl<'a, T: Element> RelBindNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    /// Return the axis which is hidden.
    pub fn bound(&self) -> &Axis {
        &self.bound
    }

    /// Return the axis whose index determines the index of [`bound`](Self::bound).
    pub fn bound_to(&self) -> &Axis {
        &self.bound_to
    }

    pub(crate) fn borrowed(&self) -> RelBindNode<'_, T> {
        RelBindNode {
            child: self.child.borrowed(),
            bound: self.bound.clone(),
            bound_to: self.bound_to.clone(),
            bound_pos: self.bound_pos,
            to_pos: self.to_pos,
            adapter: self.adapter.clone(),
            shape: self.shape.clone(),
            dims: self.dims.clone(),
        }
    }

    fn child_indices(&self, indices: &[usize]) -> Indices {
        let bound_index = (self.adapter)(indices[self.to_pos]);
        let mut child_indices = Indices::from_slice(indices);
        child_indices.insert(self.bound_pos, bound_index);
        child_indices
    }
}

impl<'a, T: Element> Node<'a, T> for RelBindNode<'a, T> {
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
        let positions = skip_position(self.shape.len(), self.bound_pos);
        let child = OperandCuts {
            positions: &positions,
            cuts: self.child.mergeable_comps(),
        };
        mergeable_cuts(self.shape.len(), &[child], &[self.to_pos, self.to_pos + 1])
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
        let positions = skip_position(self.shape.len(), self.bound_pos);
        let child_cuts = child_cuts(cuts, &positions, self.shape.len() + 1, &[self.bound_pos]);
        let child = self.child.merged_view(&child_cuts);
        build(child, &self.bound, &self.bound_to, self.adapter)
            .unwrap_or_else(|err| panic!("{}", err))
    }
}

/// Hide the `bound` axis of `expr`, taking its index from `adapter` applied
/// to the index of `bound_to`.
///
/// Evaluating the result at `indices` evaluates `expr` with the `bound`
/// index set to `adapter(i)`, where `i` is the index of `bound_to` in
/// `indices`. `adapter` must return indices which are in range for `bound`.
///
/// Panics if `bound` or `bound_to` is not part of the shape of `expr`, or if
/// they are the same axis.
///
/// ```
/// use smet::{rel_bind, Axis, Shape, Tensor};
///
/// const RW: Axis = Axis::row("c", 3);
/// const CN: Axis = Axis::col("c", 3);
///
/// let m = Tensor::from_data(Shape::from([RW, CN]), &[], &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
/// let diag = rel_bind(m.view(), &CN, &RW, |i| i);
/// assert_eq!(diag.shape(), &Shape::from([RW]));
/// assert_eq!(diag.eval(&[1]), 5);
/// ```
pub fn rel_bind<'a, T: Element>(
    expr: Expr<'a, T>,
    bound: &Axis,
    bound_to: &Axis,
    adapter: impl Fn(usize) -> usize + Send + Sync + 'static,
) -> Expr<'a, T> {
    match try_rel_bind(expr, bound, bound_to, adapter) {
        Ok(expr) => expr,
        Err(err) => panic!("{}", err),
    }
}

/// Variant of [`rel_bind`] which returns an error instead of panicking.
pub fn try_rel_bind<'a, T: Element>(
    expr: Expr<'a, T>,
    bound: &Axis,
    bound_to: &Axis,
    adapter: impl Fn(usize) -> usize + Send + Sync + 'static,
) -> Result<Expr<'a, T>, ExprError> {
    build(expr, bound, bound_to, Arc::new(adapter))
}

fn build<'a, T: Element>(
    expr: Expr<'a, T>,
    bound: &Axis,
    bound_to: &Axis,
    adapter: Adapter,
) -> Result<Expr<'a, T>, ExprError> {
    let shape = expr.shape();
    let bound_pos = shape
        .try_position_of(bound)
        .ok_or_else(|| ExprError::MissingAxis(bound.to_string()))?;
    if !shape.contains(bound_to) || bound == bound_to {
        return Err(ExprError::MissingAxis(bound_to.to_string()));
    }

    let shape = shape.without(bound);
    let to_pos = shape.position_of(bound_to);
    let mut dims = Dims::from_slice(expr.dims());
    dims.remove(bound_pos);

    Ok(Expr::RelBind(Box::new(RelBindNode {
        child: expr,
        bound: bound.clone(),
        bound_to: bound_to.clone(),
        bound_pos,
        to_pos,
        adapter,
        shape,
        dims,
    })))
}
