use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::{Expr, Node};
use crate::merge::{child_cuts, identity_positions, mergeable_cuts, OperandCuts};
use crate::shape::Shape;

/// Expression which negates every element of its child.
pub struct NegNode<'a, T> {
    child: Expr<'a, T>,
}

impl<'a, T: Element> NegNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    pub(crate) fn borrowed(&self) -> NegNode<'_, T> {
        NegNode {
            child: self.child.borrowed(),
        }
    }
}

impl<'a, T: Element> Node<'a, T> for NegNode<'a, T> {
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
        self.child.mergeable_comps()
    }

    fn eval(&self, indices: &[usize]) -> T {
        -self.child.eval(indices)
    }

    fn place(&self, _indices: &[usize]) -> *mut T {
        unreachable!("negation is not assignable")
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        self.child.is_aliasing(ptr)
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        neg(self.child.merged_view(cuts))
    }
}

/// Return the element-wise negation of `expr`.
///
/// `neg(neg(x))` returns `x`.
pub fn neg<T: Element>(expr: Expr<'_, T>) -> Expr<'_, T> {
    match expr {
        Expr::Neg(node) => node.child,
        expr => Expr::Neg(Box::new(NegNode { child: expr })),
    }
}

/// Pass-through expression which hides the merge-ability of its child.
///
/// Every axis of a wrapped expression is a run of its own, so merged views
/// and assignments iterate it one axis at a time.
pub struct WrapNode<'a, T> {
    child: Expr<'a, T>,
}

impl<'a, T: Element> WrapNode<'a, T> {
    pub fn child(&self) -> &Expr<'a, T> {
        &self.child
    }

    pub(crate) fn borrowed(&self) -> WrapNode<'_, T> {
        WrapNode {
            child: self.child.borrowed(),
        }
    }
}

impl<'a, T: Element> Node<'a, T> for WrapNode<'a, T> {
    fn shape(&self) -> &Shape {
        self.child.shape()
    }

    fn dims(&self) -> &[usize] {
        self.child.dims()
    }

    fn is_assignable(&self) -> bool {
        self.child.is_assignable()
    }

    fn mergeable_comps(&self) -> IntSeq {
        let n_axes = self.shape().len();
        let positions = identity_positions(n_axes);
        let child = OperandCuts {
            positions: &positions,
            cuts: self.child.mergeable_comps(),
        };
        let all: Vec<usize> = (0..=n_axes).collect();
        mergeable_cuts(n_axes, &[child], &all)
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
        // Cuts include every position, so the merged view has the same axes.
        let n_axes = self.shape().len();
        let cuts = child_cuts(cuts, &identity_positions(n_axes), n_axes, &[]);
        wrap(self.child.merged_view(&cuts))
    }
}

/// Wrap `expr` so that none of its axes can be merged.
///
/// `wrap(wrap(x))` returns `wrap(x)`.
pub fn wrap<T: Element>(expr: Expr<'_, T>) -> Expr<'_, T> {
    match expr {
        Expr::Wrap(node) => Expr::Wrap(node),
        expr => Expr::Wrap(Box::new(WrapNode { child: expr })),
    }
}
