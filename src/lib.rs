//! smet is an engine for lazily evaluated expressions over tensors with
//! named axes.
//!
//! # Axes and shapes
//!
//! Each dimension of a tensor is an [`Axis`], which has a name and either a
//! fixed size or a size that is supplied when a tensor is created (a
//! _dynamic_ axis). Axes with a [`Row`](TwinRole::Row) or
//! [`Col`](TwinRole::Col) role come in _twin_ pairs which are swapped by
//! [`transpose`]. A [`Shape`] is an ordered list of distinct axes.
//!
//! Because axes are identified by name rather than by position, operations
//! on several operands match up axes by name. Adding a tensor with axes
//! `[site, spin]` to one with axes `[spin, col]` produces an expression with
//! axes `[site, spin, col]`.
//!
//! # Expressions
//!
//! A [`Tensor`] owns a buffer of elements. Its [`view`](Tensor::view) and
//! [`view_mut`](Tensor::view_mut) methods return an [`Expr`], which can be
//! combined with other expressions using the functions in this crate:
//!
//! - [`bind`] fixes an axis to an index, removing it from the shape.
//! - [`rel_bind`] ties one axis to another, eg. to extract a diagonal.
//! - [`transpose`] swaps twin axes and [`conj`] negates imaginary parts.
//! - [`neg`], [`add`], [`sub`] and [`mul_add`] compute element-wise.
//! - [`scalar`], [`scalar_mut`] and [`scalar_wrap`] lift single values into
//!   expressions, and [`wrap`] hides the structure of a subtree.
//!
//! Nothing is computed when an expression is built. Values are computed when
//! an expression is [evaluated](Expr::eval) at a list of indices, or when it
//! is written into an assignable expression using [`assign`].
//!
//! ```
//! use smet::{add, assign, bind, transpose, Axis, Shape, Tensor};
//!
//! const RW: Axis = Axis::row("col", 2);
//! const CN: Axis = Axis::col("col", 2);
//! const SITE: Axis = Axis::dynamic("site");
//!
//! let m = Tensor::from_data(Shape::from([RW, CN]), &[], &[1., 2., 3., 4.]);
//!
//! // Symmetric part of `m`, times two.
//! let sym = add(m.view(), transpose(m.view()));
//! assert_eq!(sym.eval(&[0, 1]), 5.);
//!
//! // Broadcast the first row over every site.
//! let mut rows = Tensor::<f64>::new(Shape::from([SITE, CN]), &[3]);
//! assign(rows.view_mut(), bind(m.view(), &RW, 0));
//! assert_eq!(rows.data(), &[1., 2., 1., 2., 1., 2.]);
//! ```
//!
//! # Merged views
//!
//! Adjacent axes which every node in a tree traverses in the same row-major
//! order can be iterated as a single flattened axis.
//! [`Expr::mergeable_comps`] reports these runs and [`Expr::merged_view`]
//! returns a view with the runs merged. [`assign`] uses merged views so that
//! its inner loops are as long as possible.
//!
//! # Threading
//!
//! Assignments split the outermost merged axis across a Rayon thread pool.
//! The pool used by default is sized to the number of physical cores, and can
//! be accessed using [`thread_pool`].
//!
//! # Environment variables
//!
//! - `SMET_NUM_THREADS` sets the size of the default thread pool.
//! - `SMET_PARALLEL` disables parallel assignment when set to a false value.
//! - `SMET_PAR_MIN_LEN` sets the minimum outer length for a parallel
//!   assignment.
//!
//! # Crate features
//!
//! - **serde** - Implements serialization of [`Tensor`] and deserialization
//!   into a tensor of known shape via [`TensorSeed`].

mod alloc;
mod assign;
mod axis;
mod env;
mod expr;
mod indexer;
mod merge;
mod shape;
mod tensor;
mod threading;

#[cfg(feature = "serde")]
mod impl_serialize;

pub mod errors;
pub mod physics;

pub use alloc::{AlignedBuf, Alloc, GlobalAlloc, DEFAULT_ALIGN};
pub use assign::{assign, assign_with, try_assign, try_assign_with, AssignOptions};
pub use axis::{Axis, AxisSize, TwinRole};
pub use expr::{
    add, adj, bind, conj, mul_add, neg, rel_bind, scalar, scalar_mut, scalar_wrap, sub,
    transpose, try_add, try_bind, try_mul_add, try_rel_bind, wrap, Adapter, AddNode, BindNode,
    ConjNode, Expr, ExprKind, MulAddNode, NaryNode, NegNode, RelBindNode, ScalarNode,
    StorageView, TransposeNode, WrapNode,
};
pub use indexer::{index, try_index, Dims};
pub use merge::{child_cuts, common_cuts, mergeable_cuts, OperandCuts};
pub use shape::{PositionTable, Shape};
pub use tensor::{DynSizes, Tensor};
pub use threading::{thread_pool, ThreadPool};

#[cfg(feature = "serde")]
pub use impl_serialize::TensorSeed;

pub use smet_base::int_seq::IntSeq;
pub use smet_base::num::Element;
