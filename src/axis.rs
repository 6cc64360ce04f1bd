//! Named tensor axes.

use std::fmt;
use std::sync::Arc;

/// Declared size of an axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AxisSize {
    /// Size known when the axis is declared.
    Fixed(usize),

    /// Size supplied when a storage tensor with this axis is constructed.
    Dynamic,
}

/// Role of an axis within a twin pair.
///
/// `Row` and `Col` axes with the same name are twins of each other, and are
/// swapped by [`transpose`](crate::transpose).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TwinRole {
    Plain,
    Row,
    Col,
}

impl TwinRole {
    fn twin(self) -> TwinRole {
        match self {
            TwinRole::Plain => TwinRole::Plain,
            TwinRole::Row => TwinRole::Col,
            TwinRole::Col => TwinRole::Row,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Label {
    Named(&'static str),
    Merged(Arc<[Axis]>),
}

/// A named tensor dimension.
///
/// Axes are compared by name, size and twin role. Two axes which compare equal
/// are the same axis, so a [`Shape`](crate::Shape) can contain each at most
/// once.
///
/// ```
/// use smet::{Axis, AxisSize};
///
/// const ROW_COLOR: Axis = Axis::row("col", 3);
///
/// assert_eq!(ROW_COLOR.twin(), Axis::col("col", 3));
/// assert_eq!(ROW_COLOR.twin().twin(), ROW_COLOR);
/// assert_eq!(ROW_COLOR.size(), AxisSize::Fixed(3));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Axis {
    label: Label,
    size: AxisSize,
    role: TwinRole,
}

impl Axis {
    /// Create an axis with a fixed size and no twin.
    pub const fn new(name: &'static str, size: usize) -> Axis {
        Axis {
            label: Label::Named(name),
            size: AxisSize::Fixed(size),
            role: TwinRole::Plain,
        }
    }

    /// Create an axis whose size is given when a storage tensor is created.
    pub const fn dynamic(name: &'static str) -> Axis {
        Axis {
            label: Label::Named(name),
            size: AxisSize::Dynamic,
            role: TwinRole::Plain,
        }
    }

    /// Create the row member of a twin pair.
    pub const fn row(name: &'static str, size: usize) -> Axis {
        Axis {
            label: Label::Named(name),
            size: AxisSize::Fixed(size),
            role: TwinRole::Row,
        }
    }

    /// Create the column member of a twin pair.
    pub const fn col(name: &'static str, size: usize) -> Axis {
        Axis {
            label: Label::Named(name),
            size: AxisSize::Fixed(size),
            role: TwinRole::Col,
        }
    }

    /// Create an axis which iterates over `components` as one flattened axis,
    /// in row-major order.
    ///
    /// A single component is returned unchanged. The merged axis is dynamic if
    /// any component is dynamic.
    pub fn merged(components: &[Axis]) -> Axis {
        if let [single] = components {
            return single.clone();
        }

        let size = components
            .iter()
            .try_fold(1, |acc, c| match c.size {
                AxisSize::Fixed(n) => Some(acc * n),
                AxisSize::Dynamic => None,
            })
            .map(AxisSize::Fixed)
            .unwrap_or(AxisSize::Dynamic);

        Axis {
            label: Label::Merged(components.into()),
            size,
            role: TwinRole::Plain,
        }
    }

    /// Return the name of a named axis, or `None` for a merged axis.
    pub fn name(&self) -> Option<&'static str> {
        match self.label {
            Label::Named(name) => Some(name),
            Label::Merged(_) => None,
        }
    }

    pub fn size(&self) -> AxisSize {
        self.size
    }

    /// Return the size if it is fixed.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.size {
            AxisSize::Fixed(n) => Some(n),
            AxisSize::Dynamic => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.size == AxisSize::Dynamic
    }

    pub fn role(&self) -> TwinRole {
        self.role
    }

    /// Return the twin of this axis.
    ///
    /// Plain axes are their own twins. The twin of a merged axis merges the
    /// twins of its components.
    pub fn twin(&self) -> Axis {
        match &self.label {
            Label::Named(_) => Axis {
                label: self.label.clone(),
                size: self.size,
                role: self.role.twin(),
            },
            Label::Merged(components) => {
                let twins: Vec<Axis> = components.iter().map(|c| c.twin()).collect();
                Axis::merged(&twins)
            }
        }
    }

    /// Return true if this axis differs from its twin.
    pub fn is_true_twin(&self) -> bool {
        match &self.label {
            Label::Named(_) => self.role != TwinRole::Plain,
            Label::Merged(components) => components.iter().any(|c| c.is_true_twin()),
        }
    }

    /// Return the axes this axis was merged from, or the axis itself if it
    /// was not created by [`Axis::merged`].
    pub fn components(&self) -> &[Axis] {
        match &self.label {
            Label::Named(_) => std::slice::from_ref(self),
            Label::Merged(components) => components,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Label::Named(name) => match self.role {
                TwinRole::Plain => write!(f, "{}", name),
                TwinRole::Row => write!(f, "rw_{}", name),
                TwinRole::Col => write!(f, "cn_{}", name),
            },
            Label::Merged(components) => {
                write!(f, "(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            AxisSize::Fixed(n) => write!(f, "{}[{}]", self, n),
            AxisSize::Dynamic => write!(f, "{}[?]", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, AxisSize, TwinRole};

    const A: Axis = Axis::new("a", 2);
    const RW: Axis = Axis::row("s", 4);
    const CN: Axis = Axis::col("s", 4);
    const SITE: Axis = Axis::dynamic("site");

    #[test]
    fn test_identity() {
        assert_ne!(RW, CN);
        assert_ne!(A, Axis::new("a", 3));
        assert_eq!(A, Axis::new("a", 2));
        assert_eq!(RW.name(), Some("s"));
        assert_eq!(CN.role(), TwinRole::Col);
    }

    #[test]
    fn test_twin() {
        assert_eq!(A.twin(), A);
        assert!(!A.is_true_twin());
        assert_eq!(RW.twin(), CN);
        assert_eq!(CN.twin(), RW);
        assert!(RW.is_true_twin());
    }

    #[test]
    fn test_merged() {
        let m = Axis::merged(&[A, RW]);
        assert_eq!(m.size(), AxisSize::Fixed(8));
        assert_eq!(m.components(), &[A, RW]);
        assert_eq!(m.name(), None);
        assert!(m.is_true_twin());
        assert_eq!(m.twin(), Axis::merged(&[A, CN]));
        assert_eq!(m.twin().twin(), m);

        assert_eq!(Axis::merged(&[RW]), RW);
        assert_eq!(A.components(), &[A]);

        let dyn_merged = Axis::merged(&[SITE, A]);
        assert!(dyn_merged.is_dynamic());
        assert_eq!(dyn_merged.fixed_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(A.to_string(), "a");
        assert_eq!(RW.to_string(), "rw_s");
        assert_eq!(Axis::merged(&[A, CN]).to_string(), "(a,cn_s)");
        assert_eq!(format!("{:?}", SITE), "site[?]");
        assert_eq!(format!("{:?}", CN), "cn_s[4]");
    }
}
