//! Axis families of lattice field theory tensors.
//!
//! Fields carry complex components, colour and spin indices with row and
//! column twins, a Lorentz direction and a lattice site whose extent is only
//! known at run time. The helpers in this module bind those axes by role, so
//! that eg. [`spin`] works on a spinor (which has a row spin axis) and on a
//! transposed spinor (which has a column spin axis).

use smet_base::num::Element;

use crate::axis::Axis;
use crate::expr::{bind, rel_bind, Expr};

/// Real and imaginary parts of a complex number.
pub const COMPL: Axis = Axis::new("reim", 2);

/// Index of the real part along [`COMPL`].
pub const REAL_PART_ID: usize = 0;

/// Index of the imaginary part along [`COMPL`].
pub const IMAG_PART_ID: usize = 1;

/// Row colour index.
pub const RW_COL: Axis = Axis::row("col", 3);

/// Column colour index.
pub const CN_COL: Axis = Axis::col("col", 3);

/// Row spin index.
pub const RW_SPIN: Axis = Axis::row("spin", 4);

/// Column spin index.
pub const CN_SPIN: Axis = Axis::col("spin", 4);

/// Lorentz direction.
pub const DIR: Axis = Axis::new("dir", 4);

/// Lattice site.
pub const SITE: Axis = Axis::dynamic("site");

/// Bind the complex axis of `x` to `k`.
pub fn reim<T: Element>(x: Expr<'_, T>, k: usize) -> Expr<'_, T> {
    bind(x, &COMPL, k)
}

/// Return the real part of `x`.
///
/// ```
/// use smet::physics::{imag, real, COMPL, SITE};
/// use smet::{Shape, Tensor};
///
/// let z = Tensor::from_data(Shape::from([SITE, COMPL]), &[2], &[1., 2., 3., 4.]);
/// assert_eq!(real(z.view()).eval(&[1]), 3.);
/// assert_eq!(imag(z.view()).eval(&[1]), 4.);
/// ```
pub fn real<T: Element>(x: Expr<'_, T>) -> Expr<'_, T> {
    reim(x, REAL_PART_ID)
}

/// Return the imaginary part of `x`.
pub fn imag<T: Element>(x: Expr<'_, T>) -> Expr<'_, T> {
    reim(x, IMAG_PART_ID)
}

/// Bind the spin axis of `x`, whichever of [`RW_SPIN`] and [`CN_SPIN`] it
/// has, to `k`.
pub fn spin<T: Element>(x: Expr<'_, T>, k: usize) -> Expr<'_, T> {
    bind(x, &RW_SPIN, k)
}

/// Bind the colour axis of `x`, whichever of [`RW_COL`] and [`CN_COL`] it
/// has, to `k`.
pub fn col<T: Element>(x: Expr<'_, T>, k: usize) -> Expr<'_, T> {
    bind(x, &RW_COL, k)
}

/// Bind the Lorentz direction of `x` to `k`.
pub fn dir<T: Element>(x: Expr<'_, T>, k: usize) -> Expr<'_, T> {
    bind(x, &DIR, k)
}

/// Bind the lattice site of `x` to `k`.
pub fn site<T: Element>(x: Expr<'_, T>, k: usize) -> Expr<'_, T> {
    bind(x, &SITE, k)
}

/// Return the diagonal of `x` over `row_axis` and its twin.
///
/// The twin is hidden, and the element at index `i` of `row_axis` is the
/// element of `x` with both axes set to `i`.
pub fn diag<'a, T: Element>(x: Expr<'a, T>, row_axis: &Axis) -> Expr<'a, T> {
    rel_bind(x, &row_axis.twin(), row_axis, |i| i)
}
