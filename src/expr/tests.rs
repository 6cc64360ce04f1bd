use smet_base::int_seq::IntSeq;
use smet_testing::{index_tuples, unravel, TestCases};

use super::{
    add, adj, bind, conj, mul_add, neg, rel_bind, scalar, transpose, try_bind, wrap, Expr,
    ExprKind,
};
use crate::assign::assign;
use crate::axis::Axis;
use crate::errors::ExprError;
use crate::physics::{real, spin, COMPL, RW_COL, RW_SPIN};
use crate::shape::Shape;
use crate::tensor::Tensor;

const A: Axis = Axis::new("a", 2);
const B: Axis = Axis::new("b", 3);
const C: Axis = Axis::new("c", 4);
const RW: Axis = Axis::row("s", 3);
const CN: Axis = Axis::col("s", 3);
const SITE: Axis = Axis::dynamic("site");

fn random(shape: Shape, dyn_sizes: &[usize], seed: u64) -> Tensor<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    Tensor::from_fn(shape, dyn_sizes, |_| rng.f64() - 0.5)
}

/// Check that `x` and `y` have the same shape and elements.
fn assert_same(x: &Expr<f64>, y: &Expr<f64>) {
    assert_eq!(x.shape(), y.shape());
    assert_eq!(x.dims(), y.dims());
    for idx in index_tuples(x.dims()) {
        assert_eq!(x.eval(&idx), y.eval(&idx), "mismatch at {:?}", idx);
    }
}

/// Check that every merged view of `make()` agrees with the unmerged
/// expression.
///
/// The views tried are those for the mergeable cuts and for every finer set
/// of cuts, ie. the mergeable cuts plus any subset of the inner positions.
fn assert_merge_round_trip<'a>(make: impl Fn() -> Expr<'a, f64>) {
    let expr = make();
    let n_axes = expr.shape().len();
    let required = expr.mergeable_comps();
    assert!(required.is_valid_cuts(n_axes));

    let n_inner = n_axes.saturating_sub(1);
    for mask in 0..1usize << n_inner {
        let cuts: IntSeq = (0..=n_axes)
            .filter(|&pos| {
                let extra = pos > 0 && pos < n_axes && mask & (1 << (pos - 1)) != 0;
                required.contains(&pos) || extra
            })
            .collect();

        let merged = make().merged_view(&cuts);
        assert_eq!(merged.shape().len(), cuts.len() - 1);
        assert_eq!(merged.len(), expr.len());

        for idx in index_tuples(merged.dims()) {
            let mut full = Vec::new();
            for (run, &i) in cuts.runs().zip(&idx) {
                full.extend(unravel(i, &expr.dims()[run]));
            }
            assert_eq!(
                merged.eval(&idx),
                expr.eval(&full),
                "mismatch for cuts {:?} at {:?}",
                cuts,
                idx
            );
        }
    }
}

#[test]
fn test_double_unary_collapses() {
    let t = random(Shape::from([RW, COMPL, CN]), &[], 1);

    let x = neg(neg(t.view()));
    assert_eq!(x.kind(), ExprKind::Storage);
    assert_same(&x, &t.view());

    let x = conj(conj(t.view()));
    assert_eq!(x.kind(), ExprKind::Storage);
    assert_same(&x, &t.view());

    let x = transpose(transpose(t.view()));
    assert_eq!(x.kind(), ExprKind::Storage);
    assert_same(&x, &t.view());

    let x = adj(adj(t.view()));
    assert_eq!(x.kind(), ExprKind::Storage);
    assert_same(&x, &t.view());
}

#[test]
fn test_conj_moves_inside_transpose() {
    let t = random(Shape::from([RW, COMPL, CN]), &[], 2);

    let x = conj(transpose(t.view()));
    assert_eq!(x.kind(), ExprKind::Transpose);
    assert_same(&x, &transpose(conj(t.view())));

    // Imaginary parts are negated and the spin axes relabelled.
    assert_eq!(x.shape(), &Shape::from([CN, COMPL, RW]));
    for idx in index_tuples(x.dims()) {
        let sign = if idx[1] == 1 { -1. } else { 1. };
        assert_eq!(x.eval(&idx), sign * t.get(&idx));
    }
}

#[test]
fn test_bind_splices_index() {
    #[derive(Debug)]
    struct Case {
        axis: Axis,
    }

    let cases = [Case { axis: A }, Case { axis: B }, Case { axis: C }];

    cases.test_each(|case| {
        let t = random(Shape::from([A, B, C]), &[], 3);
        let pos = t.shape().position_of(&case.axis);
        let size = t.dims()[pos];

        for k in 0..size {
            let x = bind(t.view(), &case.axis, k);
            assert_eq!(x.shape(), &t.shape().without(&case.axis));
            for idx in index_tuples(x.dims()) {
                let mut full = idx.clone();
                full.insert(pos, k);
                assert_eq!(x.eval(&idx), *t.get(&full));
            }
        }
    })
}

#[test]
fn test_bind_to_scalar() {
    let mut t = Tensor::from_data(Shape::from([A]), &[], &[1., 2.]);

    let value = bind(t.view(), &A, 1);
    assert_eq!(value.kind(), ExprKind::Scalar);
    assert!(!value.is_assignable());
    assert_eq!(value.eval(&[]), 2.);
    drop(value);

    let x = bind(t.view_mut(), &A, 0);
    assert!(x.is_assignable());
    assert!(x.is_storing());
    assign(x, scalar(5.));
    assert_eq!(t.data(), &[5., 2.]);
}

#[test]
fn test_bind_errors() {
    let t = Tensor::<f64>::new(Shape::from([A, B]), &[]);
    assert_eq!(
        try_bind(t.view(), &C, 0).err(),
        Some(ExprError::MissingAxis("c".into()))
    );
    assert_eq!(
        try_bind(t.view(), &B, 3).err(),
        Some(ExprError::IndexOutOfRange {
            axis: "b".into(),
            index: 3,
            size: 3
        })
    );
}

#[test]
#[should_panic(expected = "index 2 is out of range for axis a of size 2")]
fn test_bind_panics() {
    let t = Tensor::<f64>::new(Shape::from([A, B]), &[]);
    bind(t.view(), &A, 2);
}

#[test]
#[should_panic(expected = "expected 2 indices but 1 were given")]
fn test_eval_wrong_arity() {
    let t = Tensor::<f64>::new(Shape::from([A, B]), &[]);
    t.view().eval(&[0]);
}

#[test]
fn test_merge_round_trip() {
    let t = random(Shape::from([SITE, RW, COMPL, CN]), &[5], 4);
    let u = random(Shape::from([CN, A]), &[], 5);
    let v = random(Shape::from([A, B, C]), &[], 6);

    assert_merge_round_trip(|| t.view());
    assert_merge_round_trip(|| neg(t.view()));
    assert_merge_round_trip(|| wrap(t.view()));
    assert_merge_round_trip(|| transpose(t.view()));
    assert_merge_round_trip(|| conj(t.view()));
    assert_merge_round_trip(|| adj(t.view()));
    assert_merge_round_trip(|| bind(t.view(), &COMPL, 1));
    assert_merge_round_trip(|| rel_bind(t.view(), &CN, &RW, |i| i));
    assert_merge_round_trip(|| add(t.view(), u.view()));
    assert_merge_round_trip(|| add(bind(v.view(), &A, 1), v.view()));
    assert_merge_round_trip(|| mul_add(bind(v.view(), &C, 2), v.view(), v.view()));
    assert_merge_round_trip(|| neg(add(transpose(t.view()), scalar(1.))));
    assert_merge_round_trip(|| rel_bind(t.view(), &RW, &CN, |i| 2 - i));
    assert_merge_round_trip(|| add(transpose(t.view()), t.view()));
    assert_merge_round_trip(|| wrap(add(bind(t.view(), &SITE, 3), u.view())));
    assert_merge_round_trip(|| mul_add(bind(v.view(), &B, 2), v.view(), wrap(v.view())));
    assert_merge_round_trip(|| {
        add(
            rel_bind(t.view(), &RW, &CN, |i| i),
            bind(u.view(), &A, 0),
        )
    });
}

#[test]
fn test_merged_view_of_storage() {
    let t = random(Shape::from([SITE, A, B]), &[4], 7);
    let merged = t.view().fully_merged();
    assert_eq!(merged.shape().len(), 1);
    assert_eq!(merged.dims(), &[24]);
    for i in 0..24 {
        assert_eq!(merged.eval(&[i]), t.data()[i]);
    }
}

#[test]
#[should_panic(expected = "do not include the required cuts")]
fn test_merged_view_rejects_unmergeable_cuts() {
    let t = random(Shape::from([RW, CN]), &[], 8);
    let x = transpose(t.view());
    x.merged_view(&[0, 2].into());
}

#[test]
fn test_aliasing() {
    let t = Tensor::<f64>::new(Shape::from([A, B]), &[]);
    let u = Tensor::<f64>::new(Shape::from([B]), &[]);
    let ptr = t.as_ptr();

    assert!(t.view().is_aliasing(ptr));
    assert!(neg(bind(t.view(), &A, 0)).is_aliasing(ptr));
    assert!(add(u.view(), t.view()).is_aliasing(ptr));
    assert!(!add(u.view(), scalar(1.)).is_aliasing(ptr));
    assert!(!bind(bind(t.view(), &A, 0), &B, 0).is_aliasing(ptr));
}

#[test]
fn test_write_real_part_of_each_spin() {
    let mut t = Tensor::<f64>::new(Shape::from([RW_COL, RW_SPIN, COMPL]), &[]);
    let v = random(Shape::from([RW_COL, RW_SPIN]), &[], 9);

    for s in 0..4 {
        assign(real(spin(t.view_mut(), s)), spin(v.view(), s));
    }

    for c in 0..3 {
        for s in 0..4 {
            assert_eq!(t.get(&[c, s, 0]), v.get(&[c, s]));
            assert_eq!(*t.get(&[c, s, 1]), 0.);
        }
    }
}

#[test]
fn test_add_disjoint_axes() {
    let x = random(Shape::from([A, B]), &[], 10);
    let y = random(Shape::from([B, C]), &[], 11);

    let sum = add(x.view(), y.view());
    assert_eq!(sum.shape(), &Shape::from([A, B, C]));
    assert_eq!(sum.dims(), &[2, 3, 4]);
    for idx in index_tuples(sum.dims()) {
        let (a, b, c) = (idx[0], idx[1], idx[2]);
        assert_eq!(sum.eval(&idx), x.get(&[a, b]) + y.get(&[b, c]));
    }
}
