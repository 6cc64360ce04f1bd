use std::fmt;

use smallvec::SmallVec;
use smet_base::int_seq::IntSeq;

use crate::axis::Axis;
use crate::errors::ShapeError;

/// Position of each axis of one shape within another, or `None` where the
/// axis is absent.
pub type PositionTable = SmallVec<[Option<usize>; 4]>;

/// An ordered sequence of distinct axes.
///
/// The shape of an expression lists its axes in the order in which indices
/// are passed to [`Expr::eval`](crate::Expr::eval). For a storage tensor the
/// last axis is the innermost (fastest varying) one.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    axes: SmallVec<[Axis; 4]>,
}

impl Shape {
    /// Create a shape from a sequence of axes.
    ///
    /// Panics if an axis occurs more than once.
    pub fn new(axes: impl IntoIterator<Item = Axis>) -> Shape {
        match Self::try_new(axes) {
            Ok(shape) => shape,
            Err(err) => panic!("{}", err),
        }
    }

    /// Variant of [`Shape::new`] which returns an error if an axis occurs
    /// more than once.
    pub fn try_new(axes: impl IntoIterator<Item = Axis>) -> Result<Shape, ShapeError> {
        let mut shape = Shape::empty();
        for axis in axes {
            if shape.contains(&axis) {
                return Err(ShapeError::DuplicateAxis(axis.to_string()));
            }
            shape.axes.push(axis);
        }
        Ok(shape)
    }

    /// Return the shape with no axes.
    pub const fn empty() -> Shape {
        Shape {
            axes: SmallVec::new_const(),
        }
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Axis> {
        self.axes.iter()
    }

    pub fn contains(&self, axis: &Axis) -> bool {
        self.axes.contains(axis)
    }

    /// Return true if every axis of `other` is in `self`.
    pub fn contains_all(&self, other: &Shape) -> bool {
        other.iter().all(|a| self.contains(a))
    }

    /// Return the position of `axis`.
    ///
    /// Panics if the axis is absent.
    pub fn position_of(&self, axis: &Axis) -> usize {
        self.try_position_of(axis)
            .unwrap_or_else(|| panic!("{}", ShapeError::MissingAxis(axis.to_string())))
    }

    pub fn try_position_of(&self, axis: &Axis) -> Option<usize> {
        self.axes.iter().position(|a| a == axis)
    }

    /// Return `axis` if present, otherwise its twin if that is present.
    pub fn resolve_or_twin(&self, axis: &Axis) -> Option<Axis> {
        if self.contains(axis) {
            return Some(axis.clone());
        }
        let twin = axis.twin();
        self.contains(&twin).then_some(twin)
    }

    /// Return a copy of the shape with `axis` removed.
    ///
    /// Panics if the axis is absent.
    pub fn without(&self, axis: &Axis) -> Shape {
        let pos = self.position_of(axis);
        let mut axes = self.axes.clone();
        axes.remove(pos);
        Shape { axes }
    }

    /// Return the order-preserving union of two shapes: the axes of `self`,
    /// followed by the axes of `other` that are not in `self`.
    pub fn blend(&self, other: &Shape) -> Shape {
        let mut axes = self.axes.clone();
        axes.extend(other.iter().filter(|a| !self.contains(a)).cloned());
        Shape { axes }
    }

    /// Return the shape with every axis replaced by its twin.
    pub fn twinned(&self) -> Shape {
        Shape {
            axes: self.axes.iter().map(|a| a.twin()).collect(),
        }
    }

    /// Return the position of each axis of `self` in `other`.
    pub fn positions_in(&self, other: &Shape) -> PositionTable {
        self.axes.iter().map(|a| other.try_position_of(a)).collect()
    }

    /// Return the number of dynamic axes.
    pub fn n_dynamic(&self) -> usize {
        self.axes.iter().filter(|a| a.is_dynamic()).count()
    }

    /// Return the ordinal of the axis at `pos` among the dynamic axes, or
    /// `None` if it has a fixed size.
    pub fn dynamic_slot(&self, pos: usize) -> Option<usize> {
        self.axes[pos]
            .is_dynamic()
            .then(|| self.axes[..pos].iter().filter(|a| a.is_dynamic()).count())
    }

    /// Return the product of the fixed axis sizes.
    pub fn static_len(&self) -> usize {
        self.axes.iter().filter_map(|a| a.fixed_size()).product()
    }

    /// Return the shape obtained by merging each run delimited by `cuts` into
    /// one axis.
    ///
    /// Panics if `cuts` are not valid for this shape.
    pub fn merged(&self, cuts: &IntSeq) -> Shape {
        assert!(
            cuts.is_valid_cuts(self.len()),
            "cuts {:?} are not valid for {} axes",
            cuts,
            self.len()
        );
        Shape {
            axes: cuts
                .runs()
                .map(|run| Axis::merged(&self.axes[run]))
                .collect(),
        }
    }

    /// Return the cut points which isolate every axis whose twin is also part
    /// of the shape.
    ///
    /// Transposing swaps such axes, so they can't be merged with neighbours
    /// whose meaning is unchanged.
    pub fn true_twin_cuts(&self) -> IntSeq {
        let mut cuts = IntSeq::new();
        for (pos, axis) in self.axes.iter().enumerate() {
            if axis.is_true_twin() && self.contains(&axis.twin()) {
                cuts.insert_all_ordered(&[pos, pos + 1], true);
            }
        }
        cuts
    }
}

impl<const N: usize> From<[Axis; N]> for Shape {
    fn from(axes: [Axis; N]) -> Shape {
        Shape::new(axes)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.axes.iter()).finish()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", axis)?;
        }
        write!(f, "}}")
    }
}
