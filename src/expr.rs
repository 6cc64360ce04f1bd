//! Expression nodes over named-axis tensors.
//!
//! An [`Expr`] is a tree whose leaves are views of storage tensors (or
//! scalars) and whose inner nodes rearrange or combine the values of their
//! children. Nothing is computed when a tree is built. Reading an element
//! walks the tree top-down, each node translating the index list it receives
//! into index lists for its children.
//!
//! Trees are built with the functions in this module ([`bind`],
//! [`transpose`], [`conj`], [`add`] ...). These are smart constructors which
//! return canonical forms: `neg(neg(x))` returns `x`, `conj(transpose(x))`
//! returns `transpose(conj(x))` and so on.

use std::fmt;

use smallvec::SmallVec;
use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use crate::axis::Axis;
use crate::errors::MergeError;
use crate::merge::check_cuts;
use crate::shape::Shape;
use crate::tensor::Tensor;

mod bind;
mod conj;
mod nnary;
mod rel_bind;
mod scalar;
mod storage;
mod transpose;
mod unary;

#[cfg(test)]
mod tests;

pub use bind::{bind, try_bind, BindNode};
pub use conj::{adj, conj, ConjNode};
pub use nnary::{add, mul_add, sub, try_add, try_mul_add, AddNode, MulAddNode, NaryNode};
pub use rel_bind::{rel_bind, try_rel_bind, Adapter, RelBindNode};
pub use scalar::{scalar, scalar_mut, scalar_wrap, ScalarNode};
pub use storage::StorageView;
pub use transpose::{transpose, TransposeNode};
pub use unary::{neg, wrap, NegNode, WrapNode};

/// Index list passed from a node to one of its children.
pub(crate) type Indices = SmallVec<[usize; 8]>;

/// The evaluation protocol implemented by each kind of node.
///
/// Methods other than `eval` and `place` are structural and are called while
/// building or merging a tree. `eval` and `place` receive exactly one index
/// per axis of the node's shape; [`Expr`] checks this before dispatching.
pub(crate) trait Node<'a, T: Element>: Sized {
    fn shape(&self) -> &Shape;

    /// Concrete size of each axis of the shape.
    fn dims(&self) -> &[usize];

    fn is_storing(&self) -> bool {
        false
    }

    fn is_assignable(&self) -> bool;

    fn mergeable_comps(&self) -> IntSeq;

    fn eval(&self, indices: &[usize]) -> T;

    /// Return a pointer to the element at `indices`. Only called on
    /// assignable nodes.
    fn place(&self, indices: &[usize]) -> *mut T;

    fn is_aliasing(&self, ptr: *const T) -> bool;

    /// Return the merged view for `cuts`, which have already been checked
    /// against the node's shape and mergeable runs.
    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T>;
}

/// Kind of an expression node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Storage,
    Bind,
    RelBind,
    Transpose,
    Conj,
    Neg,
    Scalar,
    Wrap,
    Add,
    MulAdd,
}

/// A node in a tensor expression tree.
///
/// The lifetime `'a` is the lifetime of the storage tensors the tree reads
/// from or writes to.
pub enum Expr<'a, T> {
    Storage(StorageView<'a, T>),
    Bind(Box<BindNode<'a, T>>),
    RelBind(Box<RelBindNode<'a, T>>),
    Transpose(Box<TransposeNode<'a, T>>),
    Conj(Box<ConjNode<'a, T>>),
    Neg(Box<NegNode<'a, T>>),
    Scalar(ScalarNode<'a, T>),
    Wrap(Box<WrapNode<'a, T>>),
    Add(Box<AddNode<'a, T>>),
    MulAdd(Box<MulAddNode<'a, T>>),
}

macro_rules! dispatch {
    ($expr:expr, $node:ident => $body:expr) => {
        match $expr {
            Expr::Storage($node) => $body,
            Expr::Bind($node) => $body,
            Expr::RelBind($node) => $body,
            Expr::Transpose($node) => $body,
            Expr::Conj($node) => $body,
            Expr::Neg($node) => $body,
            Expr::Scalar($node) => $body,
            Expr::Wrap($node) => $body,
            Expr::Add($node) => $body,
            Expr::MulAdd($node) => $body,
        }
    };
}

impl<'a, T: Element> Expr<'a, T> {
    /// Return the axes of this expression, in the order in which indices are
    /// passed to [`eval`](Expr::eval).
    pub fn shape(&self) -> &Shape {
        dispatch!(self, n => n.shape())
    }

    /// Return the concrete size of each axis.
    pub fn dims(&self) -> &[usize] {
        dispatch!(self, n => n.dims())
    }

    /// Return the concrete size of `axis`.
    ///
    /// Panics if the axis is not part of the shape.
    pub fn comp_size(&self, axis: &Axis) -> usize {
        self.dims()[self.shape().position_of(axis)]
    }

    /// Return the number of elements, ie. the product of the dims.
    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Storage(_) => ExprKind::Storage,
            Expr::Bind(_) => ExprKind::Bind,
            Expr::RelBind(_) => ExprKind::RelBind,
            Expr::Transpose(_) => ExprKind::Transpose,
            Expr::Conj(_) => ExprKind::Conj,
            Expr::Neg(_) => ExprKind::Neg,
            Expr::Scalar(_) => ExprKind::Scalar,
            Expr::Wrap(_) => ExprKind::Wrap,
            Expr::Add(_) => ExprKind::Add,
            Expr::MulAdd(_) => ExprKind::MulAdd,
        }
    }

    /// Return true if this node holds its data directly, rather than
    /// computing it from children.
    pub fn is_storing(&self) -> bool {
        dispatch!(self, n => n.is_storing())
    }

    /// Return true if this expression can be the target of
    /// [`assign`](crate::assign).
    pub fn is_assignable(&self) -> bool {
        dispatch!(self, n => n.is_assignable())
    }

    /// Return the cut points which delimit the maximal runs of axes that can
    /// be iterated as a single flattened axis.
    ///
    /// The result always starts with 0 and ends with the axis count.
    pub fn mergeable_comps(&self) -> IntSeq {
        dispatch!(self, n => n.mergeable_comps())
    }

    /// Return the element at `indices`, which has one entry per axis of the
    /// shape.
    ///
    /// Panics if the index count is wrong or an index is out of range.
    pub fn eval(&self, indices: &[usize]) -> T {
        self.check_arity(indices);
        dispatch!(self, n => n.eval(indices))
    }

    /// Return a pointer to the element at `indices` of an assignable
    /// expression.
    pub(crate) fn place(&self, indices: &[usize]) -> *mut T {
        assert!(self.is_assignable(), "expression is not assignable");
        self.check_arity(indices);
        dispatch!(self, n => n.place(indices))
    }

    /// Return true if evaluating this expression reads from the buffer
    /// starting at `ptr`.
    pub fn is_aliasing(&self, ptr: *const T) -> bool {
        dispatch!(self, n => n.is_aliasing(ptr))
    }

    /// Check whether `cuts` can be used to create a merged view.
    pub fn check_cuts(&self, cuts: &IntSeq) -> Result<(), MergeError> {
        check_cuts(self.shape().len(), &self.mergeable_comps(), cuts)
    }

    /// Return a view of this expression with one axis per run of axes
    /// delimited by `cuts`.
    ///
    /// Each merged axis has a size equal to the product of the sizes in its
    /// run, and is indexed in row-major order over the run. Evaluating the
    /// merged view at a merged index gives the same value as evaluating this
    /// expression at the corresponding unmerged indices.
    ///
    /// Panics if `cuts` is not valid for this shape, or does not include every
    /// cut in [`mergeable_comps`](Expr::mergeable_comps).
    pub fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        if let Err(err) = self.check_cuts(cuts) {
            panic!("{}", err);
        }
        dispatch!(self, n => n.merged_view(cuts))
    }

    /// Return the view with every mergeable run merged.
    pub fn fully_merged(self) -> Expr<'a, T> {
        let cuts = self.mergeable_comps();
        self.merged_view(&cuts)
    }

    /// Evaluate every element into a new storage tensor with the same shape.
    pub fn to_tensor(&self) -> Tensor<T> {
        let shape = self.shape();
        let dyn_sizes: SmallVec<[usize; 2]> = shape
            .iter()
            .zip(self.dims())
            .filter(|(axis, _)| axis.is_dynamic())
            .map(|(_, &size)| size)
            .collect();
        let mut tensor = Tensor::new(shape.clone(), &dyn_sizes);
        crate::assign::assign(tensor.view_mut(), self.borrowed());
        tensor
    }

    /// Return a read-only copy of this tree which borrows the same storage.
    ///
    /// Scalars which refer to a place are copied by value.
    pub fn borrowed(&self) -> Expr<'_, T> {
        match self {
            Expr::Storage(v) => Expr::Storage(v.read_only()),
            Expr::Bind(n) => Expr::Bind(Box::new(n.borrowed())),
            Expr::RelBind(n) => Expr::RelBind(Box::new(n.borrowed())),
            Expr::Transpose(n) => Expr::Transpose(Box::new(n.borrowed())),
            Expr::Conj(n) => Expr::Conj(Box::new(n.borrowed())),
            Expr::Neg(n) => Expr::Neg(Box::new(n.borrowed())),
            Expr::Scalar(n) => Expr::Scalar(n.read_only()),
            Expr::Wrap(n) => Expr::Wrap(Box::new(n.borrowed())),
            Expr::Add(n) => Expr::Add(Box::new(n.borrowed())),
            Expr::MulAdd(n) => Expr::MulAdd(Box::new(n.borrowed())),
        }
    }

    fn check_arity(&self, indices: &[usize]) {
        let n_axes = self.shape().len();
        assert!(
            indices.len() == n_axes,
            "expected {} indices but {} were given",
            n_axes,
            indices.len()
        );
    }
}

impl<'a, T: Element> From<T> for Expr<'a, T> {
    fn from(value: T) -> Expr<'a, T> {
        scalar(value)
    }
}

impl<'a, T: Element> std::ops::Add for Expr<'a, T> {
    type Output = Expr<'a, T>;

    fn add(self, rhs: Expr<'a, T>) -> Expr<'a, T> {
        add(self, rhs)
    }
}

impl<'a, T: Element> std::ops::Sub for Expr<'a, T> {
    type Output = Expr<'a, T>;

    fn sub(self, rhs: Expr<'a, T>) -> Expr<'a, T> {
        sub(self, rhs)
    }
}

impl<'a, T: Element> std::ops::Neg for Expr<'a, T> {
    type Output = Expr<'a, T>;

    fn neg(self) -> Expr<'a, T> {
        neg(self)
    }
}

impl<T: Element> fmt::Debug for Expr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Storage(v) => write!(f, "Storage{}", v.shape()),
            Expr::Bind(n) => f
                .debug_struct("Bind")
                .field("axis", &format_args!("{}", n.axis()))
                .field("index", &n.index())
                .field("child", n.child())
                .finish(),
            Expr::RelBind(n) => f
                .debug_struct("RelBind")
                .field("bound", &format_args!("{}", n.bound()))
                .field("bound_to", &format_args!("{}", n.bound_to()))
                .field("child", n.child())
                .finish(),
            Expr::Transpose(n) => f.debug_tuple("Transpose").field(n.child()).finish(),
            Expr::Conj(n) => f.debug_tuple("Conj").field(n.child()).finish(),
            Expr::Neg(n) => f.debug_tuple("Neg").field(n.child()).finish(),
            Expr::Scalar(n) => match n {
                ScalarNode::Value(v) => f.debug_tuple("Scalar").field(v).finish(),
                ScalarNode::Place(..) => write!(f, "Scalar(<place>)"),
            },
            Expr::Wrap(n) => f.debug_tuple("Wrap").field(n.child()).finish(),
            Expr::Add(n) => debug_operands(f, "Add", n.operands()),
            Expr::MulAdd(n) => debug_operands(f, "MulAdd", n.operands()),
        }
    }
}

fn debug_operands<'x, 'e: 'x, T: Element>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    operands: impl Iterator<Item = &'x Expr<'e, T>>,
) -> fmt::Result {
    let mut tuple = f.debug_tuple(name);
    for op in operands {
        tuple.field(op);
    }
    tuple.finish()
}
