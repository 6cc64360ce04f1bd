//! Assignment of expressions to assignable expressions.

use std::sync::OnceLock;

use smallvec::smallvec;
use smet_base::num::Element;

use crate::env::{env_flag, env_usize};
use crate::errors::ExprError;
use crate::expr::{Expr, Indices};
use crate::indexer::next_index;
use crate::merge::{child_cuts, common_cuts};
use crate::threading::{thread_pool, ThreadPool};

/// Options which control how an assignment is executed.
///
/// The defaults are read from the environment when first needed:
///
/// - `SMET_PARALLEL` disables parallel assignment if set to a false value
///   such as `0` or `false`.
/// - `SMET_PAR_MIN_LEN` sets [`min_parallel_len`](Self::min_parallel_len).
#[derive(Clone)]
pub struct AssignOptions<'p> {
    /// Whether the outer axis may be split across worker threads.
    pub parallel: bool,

    /// Minimum size of the outer merged axis for the parallel path to be used.
    pub min_parallel_len: usize,

    /// Thread pool to use instead of the global one.
    pub thread_pool: Option<&'p ThreadPool>,
}

/// Settings read from the environment, parsed on first use.
struct EnvDefaults {
    parallel: bool,
    min_parallel_len: usize,
}

fn env_defaults() -> &'static EnvDefaults {
    static DEFAULTS: OnceLock<EnvDefaults> = OnceLock::new();
    DEFAULTS.get_or_init(|| EnvDefaults {
        parallel: env_flag("SMET_PARALLEL", true),
        min_parallel_len: env_usize("SMET_PAR_MIN_LEN").unwrap_or(2),
    })
}

impl Default for AssignOptions<'_> {
    fn default() -> Self {
        let defaults = env_defaults();
        AssignOptions {
            parallel: defaults.parallel,
            min_parallel_len: defaults.min_parallel_len,
            thread_pool: None,
        }
    }
}

impl<'p> AssignOptions<'p> {
    /// Return options which run the assignment on the calling thread.
    pub fn serial() -> AssignOptions<'p> {
        AssignOptions {
            parallel: false,
            ..Default::default()
        }
    }

    /// Return options which run the assignment using `pool`.
    pub fn with_thread_pool(pool: &'p ThreadPool) -> AssignOptions<'p> {
        AssignOptions {
            thread_pool: Some(pool),
            ..Default::default()
        }
    }
}

/// Evaluate `src` and write the result into `dest`.
///
/// Axes are matched by name, so `src` may list them in a different order. Its
/// axes must be a subset of those of `dest`, and it is broadcast over the
/// axes it lacks. A scalar source sets every element of `dest`.
///
/// Panics if `dest` is not assignable, if `src` has an axis that `dest`
/// lacks, or if a shared axis has different sizes.
///
/// ```
/// use smet::{assign, transpose, Axis, Shape, Tensor};
///
/// const RW: Axis = Axis::row("spin", 2);
/// const CN: Axis = Axis::col("spin", 2);
///
/// let m = Tensor::from_data(Shape::from([RW, CN]), &[], &[1, 2, 3, 4]);
/// let mut mt = Tensor::new(Shape::from([RW, CN]), &[]);
/// assign(mt.view_mut(), transpose(m.view()));
/// assert_eq!(mt.data(), &[1, 3, 2, 4]);
/// ```
pub fn assign<'a, T: Element>(dest: Expr<'a, T>, src: Expr<'a, T>) {
    assign_with(dest, src, &AssignOptions::default())
}

/// Variant of [`assign`] which returns an error instead of panicking.
pub fn try_assign<'a, T: Element>(dest: Expr<'a, T>, src: Expr<'a, T>) -> Result<(), ExprError> {
    try_assign_with(dest, src, &AssignOptions::default())
}

/// Variant of [`assign`] which takes explicit options.
pub fn assign_with<'a, T: Element>(dest: Expr<'a, T>, src: Expr<'a, T>, opts: &AssignOptions) {
    if let Err(err) = try_assign_with(dest, src, opts) {
        panic!("{}", err);
    }
}

/// Variant of [`assign_with`] which returns an error instead of panicking.
pub fn try_assign_with<'a, T: Element>(
    dest: Expr<'a, T>,
    src: Expr<'a, T>,
    opts: &AssignOptions,
) -> Result<(), ExprError> {
    check_assign(&dest, &src)?;

    if dest.is_empty() {
        return Ok(());
    }

    let dest_shape = dest.shape().clone();
    let src_shape = src.shape().clone();
    let cuts = common_cuts(&dest, &src);
    let src_positions = dest_shape.positions_in(&src_shape);
    let src_cuts = child_cuts(&cuts, &src_positions, src_shape.len(), &[]);

    let dest = dest.merged_view(&cuts);
    let src = src.merged_view(&src_cuts);

    // Position in `dest` of each axis of `src`.
    let gather: Indices = src
        .shape()
        .positions_in(dest.shape())
        .iter()
        .flatten()
        .copied()
        .collect();

    let outer_len = dest.dims().first().copied().unwrap_or(1);
    let parallel = opts.parallel && outer_len >= opts.min_parallel_len;

    tracing::debug!(
        dest = %dest_shape,
        src = %src_shape,
        cuts = ?cuts,
        parallel,
        "assign"
    );

    if dest.shape().is_empty() {
        let value = src.eval(&[]);
        // Safety: `dest` is assignable, and owns the only reference to the
        // place.
        unsafe { dest.place(&[]).write(value) };
        return Ok(());
    }

    let assign_outer = |_worker: usize, outer: usize| {
        assign_block(&dest, &src, &gather, outer);
    };
    if parallel {
        let pool = match opts.thread_pool {
            Some(pool) => pool,
            None => thread_pool(),
        };
        pool.submit(0..outer_len, assign_outer);
    } else {
        (0..outer_len).for_each(|outer| assign_outer(0, outer));
    }

    Ok(())
}

/// Check that `src` can be assigned to `dest`.
fn check_assign<T: Element>(dest: &Expr<T>, src: &Expr<T>) -> Result<(), ExprError> {
    if !dest.is_assignable() {
        return Err(ExprError::NotAssignable);
    }
    for (axis, &size) in src.shape().iter().zip(src.dims()) {
        let Some(pos) = dest.shape().try_position_of(axis) else {
            return Err(ExprError::MissingAxis(axis.to_string()));
        };
        let dest_size = dest.dims()[pos];
        if dest_size != size {
            return Err(ExprError::SizeMismatch {
                axis: axis.to_string(),
                left: dest_size,
                right: size,
            });
        }
    }
    Ok(())
}

/// Assign every element of `dest` whose first index is `outer`.
///
/// `dest` and `src` are merged views and `dest` has at least one axis.
fn assign_block<T: Element>(dest: &Expr<T>, src: &Expr<T>, gather: &[usize], outer: usize) {
    let dims = dest.dims();
    let mut indices: Indices = smallvec![0; dims.len()];
    indices[0] = outer;
    let mut src_indices: Indices = smallvec![0; gather.len()];

    loop {
        for (src_index, &pos) in src_indices.iter_mut().zip(gather) {
            *src_index = indices[pos];
        }
        let value = src.eval(&src_indices);

        // Safety: `dest` is assignable and its element at `indices` is
        // written by this call only, since blocks have distinct `outer`
        // indices.
        unsafe { dest.place(&indices).write(value) };

        if !next_index(&mut indices[1..], &dims[1..]) {
            break;
        }
    }
}
