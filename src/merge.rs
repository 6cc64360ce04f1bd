//! Merge-ability analysis.
//!
//! A list of cut points partitions the axes of an expression into runs. A run
//! is mergeable if its axes can be iterated as one flattened axis, in
//! row-major order, without changing which element each index combination
//! refers to. Storage views are fully mergeable; other nodes derive their
//! runs from their children using [`mergeable_cuts`], and re-express the cuts
//! of a merged view in their children's numbering using [`child_cuts`].

use smet_base::bit_set::BitSet;
use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use crate::errors::MergeError;
use crate::expr::Expr;
use crate::indexer::Dims;

/// Merge information for one child (operand) of a node.
pub struct OperandCuts<'p> {
    /// For each axis of the node, its position in the operand, or `None` if
    /// the operand does not have the axis.
    pub positions: &'p [Option<usize>],

    /// The operand's own mergeable cuts.
    pub cuts: IntSeq,
}

/// Return the mergeable cuts of a node with `n_axes` axes whose children are
/// described by `operands`.
///
/// A cut is placed before axis `k` if:
///
/// - some operand has the axis at a position where it has a cut, or
/// - the set of operands which have the axis differs from the set for axis
///   `k - 1`, or
/// - some operand has both axes but not next to each other, in order.
///
/// `extra_cuts` are then added. Positions greater than `n_axes` are ignored.
pub fn mergeable_cuts(n_axes: usize, operands: &[OperandCuts], extra_cuts: &[usize]) -> IntSeq {
    let presence = |k: usize| -> BitSet {
        operands
            .iter()
            .enumerate()
            .filter(|(_, op)| op.positions[k].is_some())
            .map(|(i, _)| i)
            .collect()
    };

    let mut cuts = IntSeq::from([0]);
    for k in 1..n_axes {
        let mut cut = presence(k) != presence(k - 1);
        for op in operands {
            let Some(pos) = op.positions[k] else {
                continue;
            };
            if op.cuts.contains(&pos) {
                cut = true;
            }
            if let Some(prev) = op.positions[k - 1] {
                if pos != prev + 1 {
                    cut = true;
                }
            }
        }
        if cut {
            cuts.push(k);
        }
    }
    cuts.insert_ordered(n_axes, 0, true);

    for &c in extra_cuts {
        if c <= n_axes {
            cuts.insert_ordered(c, 0, true);
        }
    }
    cuts
}

/// Return the position table of a child whose axes are those of the parent
/// with one axis inserted at `pos`.
pub fn skip_position(n_axes: usize, pos: usize) -> Vec<Option<usize>> {
    (0..n_axes)
        .map(|k| Some(if k < pos { k } else { k + 1 }))
        .collect()
}

/// Return the position table of a child with the same axes as its parent.
pub fn identity_positions(n_axes: usize) -> Vec<Option<usize>> {
    (0..n_axes).map(Some).collect()
}

/// Re-express the cuts of a merged view in the numbering of a child with
/// `child_len` axes.
///
/// `positions` gives the child position of each parent axis (see
/// [`OperandCuts::positions`]). Runs of axes the child does not have are
/// skipped. Each position in `singletons` is isolated in a run of its own,
/// which is used for child axes that the parent hides (eg. a bound axis).
pub fn child_cuts(
    cuts: &IntSeq,
    positions: &[Option<usize>],
    child_len: usize,
    singletons: &[usize],
) -> IntSeq {
    let mut child = IntSeq::from([0]);
    child.insert_ordered(child_len, 0, true);
    for c in IntSeq::gather_present(positions, child_len, cuts).iter() {
        child.insert_ordered(*c, 0, true);
    }
    for &s in singletons {
        child.insert_all_ordered(&[s, s + 1], true);
    }
    child
}

/// Return the cuts which can be used to merge both sides of an assignment of
/// `src` to `dest`.
///
/// The axes of `src` must be a subset of the axes of `dest`. The result is in
/// the numbering of `dest`; use [`child_cuts`] with
/// `dest.shape().positions_in(src.shape())` to convert it for `src`.
pub fn common_cuts<T: Element>(dest: &Expr<T>, src: &Expr<T>) -> IntSeq {
    let n_axes = dest.shape().len();
    let dest_positions = identity_positions(n_axes);
    let src_positions = dest.shape().positions_in(src.shape());
    let operands = [
        OperandCuts {
            positions: &dest_positions,
            cuts: dest.mergeable_comps(),
        },
        OperandCuts {
            positions: &src_positions,
            cuts: src.mergeable_comps(),
        },
    ];
    mergeable_cuts(n_axes, &operands, &[])
}

/// Check that `cuts` is valid for `n_axes` axes and includes every cut in
/// `required`.
pub fn check_cuts(n_axes: usize, required: &IntSeq, cuts: &IntSeq) -> Result<(), MergeError> {
    if !cuts.is_valid_cuts(n_axes) {
        return Err(MergeError::InvalidCuts {
            cuts: cuts.clone(),
            len: n_axes,
        });
    }
    if !required.is_subset_of(cuts) {
        return Err(MergeError::NotSuperset {
            cuts: cuts.clone(),
            required: required.clone(),
        });
    }
    Ok(())
}

/// Return the size of each merged axis.
pub fn merged_dims(dims: &[usize], cuts: &IntSeq) -> Dims {
    cuts.runs().map(|run| dims[run].iter().product()).collect()
}
