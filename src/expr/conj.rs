use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::transpose::transpose;
use super::{Expr, Node};
use crate::merge::{identity_positions, mergeable_cuts, OperandCuts};
use crate::physics::{COMPL, IMAG_PART_ID};
use crate::shape::Shape;

/// Expression which takes the complex conjugate of its child, by negating
/// the elements whose [`COMPL`] index is the imaginary part.
pub struct ConjNode<'a, T> {
    child: Expr<'a, T>,

    /// Position of the [`COMPL`] axis.
    compl_pos: usize,
}

impl<'a, T: Element> ConjNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    pub(crate) fn borrowed(&self) -> ConjNode<'_, T> {
        ConjNode {
            child: self.child.borrowed(),
            compl_pos: self.compl_pos,
        }
    }
}

impl<'a, T: Element> Node<'a, T> for ConjNode<'a, T> {
    fn shape(&self) -> &Shape {
        self.child.shape()
    }

    fn dims(&self) -> &[usize] {
        self.child.dims()
    }

    fn is_assignable(&self) -> bool {
        false
    }

    fn mergeable_comps(&self) -> IntSeq {
        let n_axes = self.shape().len();
        let positions = identity_positions(n_axes);
        let child = OperandCuts {
            positions: &positions,
            cuts: self.child.mergeable_comps(),
        };
        mergeable_cuts(n_axes, &[child], &[self.compl_pos, self.compl_pos + 1])
    }

    fn eval(&self, indices: &[usize]) -> T {
        let value = self.child.eval(indices);
        if indices[self.compl_pos] == IMAG_PART_ID {
            -value
        } else {
            value
        }
    }

    fn place(&self, _indices: &[usize]) -> *mut T {
        unreachable!("conjugation is not assignable")
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        self.child.is_aliasing(ptr)
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        conj(self.child.merged_view(cuts))
    }
}

/// Return the complex conjugate of `expr`.
///
/// Expressions without a [`COMPL`] axis are real and are returned unchanged.
/// `conj(conj(x))` returns `x`, and `conj(transpose(x))` is built as
/// `transpose(conj(x))`.
pub fn conj<T: Element>(expr: Expr<'_, T>) -> Expr<'_, T> {
    match expr {
        Expr::Conj(node) => node.child,
        Expr::Transpose(node) => transpose(conj(node.into_child())),
        expr => match expr.shape().try_position_of(&COMPL) {
            Some(compl_pos) => Expr::Conj(Box::new(ConjNode {
                child: expr,
                compl_pos,
            })),
            None => expr,
        },
    }
}

/// Return the adjoint (conjugate transpose) of `expr`.
pub fn adj<T: Element>(expr: Expr<'_, T>) -> Expr<'_, T> {
    transpose(conj(expr))
}
