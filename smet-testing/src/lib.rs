//! Internal testing utilities for the smet crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

/// Utility for creating parametrized (aka. table-driven) tests.
///
/// Create a `Debug` struct, conventionally named `Case`, holding the data for
/// one test case, build a collection of cases and call `test_each` with the
/// test body. All cases are run, panics are caught, and if any case failed
/// the call panics with the number of failures and their debug
/// representations.
///
/// ```
/// use smet_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     dims: Vec<usize>,
///     expected_len: usize,
/// }
///
/// let cases = [
///     Case { dims: vec![3, 4], expected_len: 12 },
///     Case { dims: vec![], expected_len: 1 },
/// ];
///
/// cases.test_each(|case| {
///     assert_eq!(case.dims.iter().product::<usize>(), case.expected_len);
/// });
/// ```
///
/// `test_each` passes cases by reference. `test_each_clone` and
/// `test_each_value` pass owned cases, which is convenient when a case holds
/// something the test consumes (eg. an expression).
///
/// Cases and captured values must be unwind safe. Wrap offending fields in
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe) or build them inside the
/// test body.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call `test` with a reference to each case.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Call `test` with a clone of each case.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;

    /// Call `test` with each case by value.
    ///
    /// The case is formatted before the test runs so that it can be reported
    /// if the test panics.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

/// Collects the debug representations of failing cases.
struct Failures(Vec<String>);

impl Failures {
    fn new() -> Self {
        Failures(Vec::new())
    }

    fn record(&mut self, ok: bool, describe: impl FnOnce() -> String) {
        if !ok {
            self.0.push(describe());
        }
    }

    fn check(self) {
        assert!(
            self.0.is_empty(),
            "{} test cases failed: [{}]",
            self.0.len(),
            self.0.join(", ")
        );
    }
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let mut failures = Failures::new();
        for case in self {
            let ok = std::panic::catch_unwind(|| test(&case)).is_ok();
            failures.record(ok, || format!("{:?}", case));
        }
        failures.check();
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Clone + Debug + UnwindSafe,
    {
        let mut failures = Failures::new();
        for case in self {
            let owned = case.clone();
            let test = &test;
            let ok = std::panic::catch_unwind(move || test(owned)).is_ok();
            failures.record(ok, || format!("{:?}", case));
        }
        failures.check();
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let mut failures = Failures::new();
        for case in self {
            let desc = format!("{:?}", case);
            let test = &test;
            let ok = std::panic::catch_unwind(move || test(case)).is_ok();
            failures.record(ok, || desc);
        }
        failures.check();
    }
}

/// Iterator over every index tuple of an array with dimensions `dims`, in
/// row-major order.
///
/// An empty `dims` yields a single empty tuple. Any zero-sized dimension
/// yields nothing.
pub struct IndexTuples {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Iterator for IndexTuples {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;

        let mut succ = current.clone();
        let mut carried = true;
        for (idx, &size) in succ.iter_mut().zip(&self.dims).rev() {
            *idx += 1;
            if *idx < size {
                carried = false;
                break;
            }
            *idx = 0;
        }
        if !carried {
            self.next = Some(succ);
        }

        Some(current)
    }
}

/// Return an iterator over all index tuples for `dims`.
pub fn index_tuples(dims: &[usize]) -> IndexTuples {
    let start = if dims.contains(&0) {
        None
    } else {
        Some(vec![0; dims.len()])
    };
    IndexTuples {
        dims: dims.to_vec(),
        next: start,
    }
}

/// Split a row-major flat offset into per-axis indices.
pub fn unravel(mut offset: usize, dims: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; dims.len()];
    for (idx, &size) in indices.iter_mut().zip(dims).rev() {
        *idx = offset % size;
        offset /= size;
    }
    indices
}
