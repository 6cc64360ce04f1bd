use smet_base::int_seq::IntSeq;
use smet_base::num::Element;

use super::unary::neg;
use super::{Expr, Indices, Node};
use crate::errors::ExprError;
use crate::indexer::Dims;
use crate::merge::{child_cuts, merged_dims, mergeable_cuts, OperandCuts};
use crate::shape::{PositionTable, Shape};

/// One operand of an [`NaryNode`].
struct Operand<'a, T> {
    expr: Expr<'a, T>,

    /// Position of each axis of the node in the operand, or `None` if the
    /// operand is broadcast over it.
    positions: PositionTable,

    /// Position in the node of each axis of the operand.
    gather: Dims,
}

impl<'a, T: Element> Operand<'a, T> {
    /// Create an operand of a node with shape `shape`, which must include
    /// every axis of `expr`.
    fn new(expr: Expr<'a, T>, shape: &Shape) -> Operand<'a, T> {
        let positions = shape.positions_in(expr.shape());
        let gather = expr
            .shape()
            .positions_in(shape)
            .iter()
            .flatten()
            .copied()
            .collect();
        Operand {
            expr,
            positions,
            gather,
        }
    }

    fn borrowed(&self) -> Operand<'_, T> {
        Operand {
            expr: self.expr.borrowed(),
            positions: self.positions.clone(),
            gather: self.gather.clone(),
        }
    }

    #[inline]
    fn eval(&self, indices: &[usize]) -> T {
        let op_indices: Indices = self.gather.iter().map(|&pos| indices[pos]).collect();
        self.expr.eval(&op_indices)
    }
}

/// Expression which combines the elements of `N` operands.
///
/// The shape of the node includes the axes of every operand. Each operand is
/// evaluated with the indices of its own axes, in its own order, and is
/// broadcast over the axes it lacks.
pub struct NaryNode<'a, T, const N: usize> {
    operands: [Operand<'a, T>; N],
    shape: Shape,
    dims: Dims,
    combine: fn([T; N]) -> T,
}

/// Element-wise sum of two expressions.
pub type AddNode<'a, T> = NaryNode<'a, T, 2>;

/// Element-wise `factor * factor + addend` of three expressions.
pub type MulAddNode<'a, T> = NaryNode<'a, T, 3>;

impl<'a, T: Element, const N: usize> NaryNode<'a, T, N> {
    /// Return the operands, in the order they were passed to the builder.
    pub fn operands(&self) -> impl ExactSizeIterator<Item = &Expr<'a, T>> {
        self.operands.iter().map(|op| &op.expr)
    }

    pub(crate) fn borrowed(&self) -> NaryNode<'_, T, N> {
        NaryNode {
            operands: self.operands.each_ref().map(|op| op.borrowed()),
            shape: self.shape.clone(),
            dims: self.dims.clone(),
            combine: self.combine,
        }
    }
}

/// Conversion of a node into the matching [`Expr`] variant.
pub(crate) trait IntoExpr<'a, T> {
    fn into_expr(self) -> Expr<'a, T>;
}

impl<'a, T> IntoExpr<'a, T> for AddNode<'a, T> {
    fn into_expr(self) -> Expr<'a, T> {
        Expr::Add(Box::new(self))
    }
}

impl<'a, T> IntoExpr<'a, T> for MulAddNode<'a, T> {
    fn into_expr(self) -> Expr<'a, T> {
        Expr::MulAdd(Box::new(self))
    }
}

impl<'a, T: Element, const N: usize> Node<'a, T> for NaryNode<'a, T, N>
where
    NaryNode<'a, T, N>: IntoExpr<'a, T>,
{
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn is_assignable(&self) -> bool {
        false
    }

    fn mergeable_comps(&self) -> IntSeq {
        let operands: Vec<OperandCuts> = self
            .operands
            .iter()
            .map(|op| OperandCuts {
                positions: &op.positions,
                cuts: op.expr.mergeable_comps(),
            })
            .collect();
        mergeable_cuts(self.shape.len(), &operands, &[])
    }

    fn eval(&self, indices: &[usize]) -> T {
        let values = std::array::from_fn(|i| self.operands[i].eval(indices));
        (self.combine)(values)
    }

    fn place(&self, _indices: &[usize]) -> *mut T {
        unreachable!("operator results are not assignable")
    }

    fn is_aliasing(&self, ptr: *const T) -> bool {
        self.operands.iter().any(|op| op.expr.is_aliasing(ptr))
    }

    fn merged_view(self, cuts: &IntSeq) -> Expr<'a, T> {
        let shape = self.shape.merged(cuts);
        let dims = merged_dims(&self.dims, cuts);
        let operands = self.operands.map(|op| {
            let op_cuts = child_cuts(cuts, &op.positions, op.expr.shape().len(), &[]);
            Operand::new(op.expr.merged_view(&op_cuts), &shape)
        });
        NaryNode {
            operands,
            shape,
            dims,
            combine: self.combine,
        }
        .into_expr()
    }
}

/// Return the size of each axis of `shape`, taken from the operands which
/// have it.
fn operand_dims<T: Element>(shape: &Shape, operands: &[&Expr<T>]) -> Result<Dims, ExprError> {
    shape
        .iter()
        .map(|axis| {
            let mut sizes = operands.iter().filter_map(|op| {
                op.shape()
                    .try_position_of(axis)
                    .map(|pos| op.dims()[pos])
            });
            let size = sizes.next().unwrap_or(0);
            match sizes.find(|&other| other != size) {
                Some(other) => Err(ExprError::SizeMismatch {
                    axis: axis.to_string(),
                    left: size,
                    right: other,
                }),
                None => Ok(size),
            }
        })
        .collect()
}

/// Return the element-wise sum of `a` and `b`.
///
/// The shape of the result is `a.shape().blend(b.shape())`: the axes of `a`
/// followed by the axes of `b` that `a` lacks. Each operand is broadcast
/// over the axes it lacks.
///
/// Panics if a shared axis has different sizes in the two operands.
///
/// ```
/// use smet::{add, Axis, Shape, Tensor};
///
/// const A: Axis = Axis::new("a", 2);
/// const B: Axis = Axis::new("b", 3);
///
/// let x = Tensor::from_data(Shape::from([A]), &[], &[10, 20]);
/// let y = Tensor::from_data(Shape::from([B]), &[], &[1, 2, 3]);
/// let sum = add(x.view(), y.view());
/// assert_eq!(sum.shape(), &Shape::from([A, B]));
/// assert_eq!(sum.eval(&[1, 2]), 23);
/// ```
pub fn add<'a, T: Element>(a: Expr<'a, T>, b: Expr<'a, T>) -> Expr<'a, T> {
    match try_add(a, b) {
        Ok(sum) => sum,
        Err(err) => panic!("{}", err),
    }
}

/// Variant of [`add`] which returns an error instead of panicking.
pub fn try_add<'a, T: Element>(a: Expr<'a, T>, b: Expr<'a, T>) -> Result<Expr<'a, T>, ExprError> {
    let shape = a.shape().blend(b.shape());
    let dims = operand_dims(&shape, &[&a, &b])?;
    let operands = [Operand::new(a, &shape), Operand::new(b, &shape)];
    Ok(AddNode {
        operands,
        shape,
        dims,
        combine: |[a, b]| a + b,
    }
    .into_expr())
}

/// Return the element-wise difference `a - b`.
pub fn sub<'a, T: Element>(a: Expr<'a, T>, b: Expr<'a, T>) -> Expr<'a, T> {
    add(a, neg(b))
}

/// Return `factor1 * factor2 + addend`, element-wise.
///
/// The shape of the result is the shape of `addend`, which must include
/// every axis of the factors. Factors are broadcast over the axes they lack.
///
/// Panics if a factor has an axis that `addend` lacks, or if a shared axis
/// has different sizes.
pub fn mul_add<'a, T: Element>(
    factor1: Expr<'a, T>,
    factor2: Expr<'a, T>,
    addend: Expr<'a, T>,
) -> Expr<'a, T> {
    match try_mul_add(factor1, factor2, addend) {
        Ok(expr) => expr,
        Err(err) => panic!("{}", err),
    }
}

/// Variant of [`mul_add`] which returns an error instead of panicking.
pub fn try_mul_add<'a, T: Element>(
    factor1: Expr<'a, T>,
    factor2: Expr<'a, T>,
    addend: Expr<'a, T>,
) -> Result<Expr<'a, T>, ExprError> {
    let shape = addend.shape().clone();
    for factor in [&factor1, &factor2] {
        if let Some(axis) = factor.shape().iter().find(|a| !shape.contains(a)) {
            return Err(ExprError::MissingAxis(axis.to_string()));
        }
    }
    let dims = operand_dims(&shape, &[&factor1, &factor2, &addend])?;
    let operands = [
        Operand::new(factor1, &shape),
        Operand::new(factor2, &shape),
        Operand::new(addend, &shape),
    ];
    Ok(MulAddNode {
        operands,
        shape,
        dims,
        combine: |[f1, f2, c]| Element::mul_add(f1, f2, c),
    }
    .into_expr())
}

#[cfg(test)]
mod tests {
    use smet_base::int_seq::IntSeq;
    use smet_testing::{index_tuples, TestCases};

    use super::{add, mul_add, sub, try_add, try_mul_add};
    use crate::axis::Axis;
    use crate::errors::ExprError;
    use crate::expr::{scalar, ExprKind};
    use crate::shape::Shape;
    use crate::tensor::Tensor;

    const A: Axis = Axis::new("a", 2);
    const B: Axis = Axis::new("b", 3);
    const C: Axis = Axis::new("c", 4);
    const SITE: Axis = Axis::dynamic("site");

    fn iota(shape: Shape, offset: i32) -> Tensor<i32> {
        let mut n = offset;
        Tensor::from_fn(shape, &[], |_| {
            n += 1;
            n
        })
    }

    #[test]
    fn test_add_blends_shapes() {
        let ab = iota(Shape::from([A, B]), 0);
        let bc = iota(Shape::from([B, C]), 100);
        let sum = add(ab.view(), bc.view());
        assert_eq!(sum.kind(), ExprKind::Add);
        assert_eq!(sum.shape(), &Shape::from([A, B, C]));
        assert_eq!(sum.dims(), &[2, 3, 4]);
        assert!(!sum.is_assignable());
        assert!(!sum.is_storing());

        for idx in index_tuples(&[2, 3, 4]) {
            let expected = ab.get(&idx[..2]) + bc.get(&idx[1..]);
            assert_eq!(sum.eval(&idx), expected);
        }
    }

    #[test]
    fn test_add_operand_order() {
        let ab = iota(Shape::from([A, B]), 0);
        let ba = iota(Shape::from([B, A]), 10);
        let sum = add(ab.view(), ba.view());
        assert_eq!(sum.shape(), &Shape::from([A, B]));
        for idx in index_tuples(&[2, 3]) {
            assert_eq!(
                sum.eval(&idx),
                ab.get(&idx) + ba.get(&[idx[1], idx[0]])
            );
        }
    }

    #[test]
    fn test_add_scalar_and_sub() {
        let ab = iota(Shape::from([A, B]), 0);
        let x = add(ab.view(), scalar(5));
        assert_eq!(x.eval(&[1, 2]), 11);

        let y = sub(ab.view(), ab.view());
        assert!(index_tuples(&[2, 3]).all(|idx| y.eval(&idx) == 0));

        let z = ab.view() + scalar(1) - ab.view();
        assert_eq!(z.eval(&[0, 1]), 1);
    }

    #[test]
    fn test_add_mergeable() {
        #[derive(Debug)]
        struct Case {
            left: Shape,
            right: Shape,
            expected: IntSeq,
        }

        let cases = [
            Case {
                left: Shape::from([A, B]),
                right: Shape::from([A, B]),
                expected: IntSeq::from([0, 2]),
            },
            Case {
                left: Shape::from([A, B]),
                right: Shape::from([B, C]),
                expected: IntSeq::from([0, 1, 2, 3]),
            },
            Case {
                left: Shape::from([A, B, C]),
                right: Shape::from([B, C]),
                expected: IntSeq::from([0, 1, 3]),
            },
            Case {
                left: Shape::from([A, B]),
                right: Shape::from([B, A]),
                expected: IntSeq::from([0, 1, 2]),
            },
        ];

        cases.test_each(|case| {
            let left = Tensor::<i32>::new(case.left.clone(), &[]);
            let right = Tensor::<i32>::new(case.right.clone(), &[]);
            let sum = add(left.view(), right.view());
            assert_eq!(sum.mergeable_comps(), case.expected);
        })
    }

    #[test]
    fn test_add_merged_view() {
        let abc = iota(Shape::from([A, B, C]), 0);
        let bc = iota(Shape::from([B, C]), 50);
        let sum = add(abc.view(), bc.view());
        let expected: Vec<i32> = index_tuples(&[2, 3, 4]).map(|idx| sum.eval(&idx)).collect();

        let merged = sum.fully_merged();
        assert_eq!(merged.kind(), ExprKind::Add);
        assert_eq!(merged.dims(), &[2, 12]);
        let actual: Vec<i32> = index_tuples(&[2, 12]).map(|idx| merged.eval(&idx)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_add_size_mismatch() {
        let x = Tensor::<i32>::new(Shape::from([SITE]), &[3]);
        let y = Tensor::<i32>::new(Shape::from([SITE, A]), &[4]);
        assert_eq!(
            try_add(x.view(), y.view()).err(),
            Some(ExprError::SizeMismatch {
                axis: "site".into(),
                left: 3,
                right: 4
            })
        );
    }

    #[test]
    fn test_mul_add() {
        let a = iota(Shape::from([A]), 0);
        let b = iota(Shape::from([B]), 10);
        let ab = iota(Shape::from([A, B]), 100);
        let x = mul_add(a.view(), b.view(), ab.view());
        assert_eq!(x.kind(), ExprKind::MulAdd);
        assert_eq!(x.shape(), &Shape::from([A, B]));
        for idx in index_tuples(&[2, 3]) {
            let expected = a.get(&idx[..1]) * b.get(&idx[1..]) + ab.get(&idx);
            assert_eq!(x.eval(&idx), expected);
        }

        let y = mul_add(scalar(2), a.view(), a.view());
        assert_eq!(y.eval(&[1]), 6);
    }

    #[test]
    fn test_mul_add_missing_axis() {
        let a = Tensor::<i32>::new(Shape::from([A]), &[]);
        let c = Tensor::<i32>::new(Shape::from([C]), &[]);
        assert_eq!(
            try_mul_add(a.view(), c.view(), a.view()).err(),
            Some(ExprError::MissingAxis("c".into()))
        );
    }
}
