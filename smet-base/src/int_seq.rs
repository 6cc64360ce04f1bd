//! Ordered sequences of small integers.
//!
//! Axis positions, merge cut points and position tables are all short lists
//! of `usize`. [`IntSeq`] keeps them inline and provides the ordered
//! insert/remove/filter operations used when renumbering axes between an
//! expression and its children.

use std::fmt;
use std::ops::{Deref, Range};

use smallvec::SmallVec;

/// A short sequence of non-negative integers.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct IntSeq(SmallVec<[usize; 8]>);

impl IntSeq {
    /// Return an empty sequence.
    pub fn new() -> IntSeq {
        IntSeq(SmallVec::new())
    }

    pub fn from_slice(values: &[usize]) -> IntSeq {
        IntSeq(SmallVec::from_slice(values))
    }

    /// Return `0, 1, ... n-1`.
    pub fn up_to(n: usize) -> IntSeq {
        (0..n).collect()
    }

    /// Return `min, min + step, ...` for all values less than `max`.
    ///
    /// Panics if `step` is zero.
    pub fn range(min: usize, step: usize, max: usize) -> IntSeq {
        assert!(step > 0, "range step must be positive");
        (min..max).step_by(step).collect()
    }

    /// Return a sequence of `n` copies of `value`.
    pub fn repeat(n: usize, value: usize) -> IntSeq {
        IntSeq(SmallVec::from_elem(value, n))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn push(&mut self, value: usize) {
        self.0.push(value)
    }

    /// Return true if every element is `<=` its successor.
    pub fn is_ordered(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// Return true if every element is `<` its successor.
    pub fn is_strictly_increasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] < w[1])
    }

    /// Return true if every element of `self` occurs in `other`.
    pub fn is_subset_of(&self, other: &[usize]) -> bool {
        self.0.iter().all(|x| other.contains(x))
    }

    pub fn sum(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn product(&self) -> usize {
        self.0.iter().product()
    }

    /// Sum of the first `n` elements.
    pub fn partial_sum(&self, n: usize) -> usize {
        self.0[..n].iter().sum()
    }

    /// Insert `value` into an ordered sequence, keeping it ordered, and add
    /// `incr_after` to every element after the insertion point.
    ///
    /// If `value` is already present the sequence is only shifted when
    /// `ignore_if_present` is set, and the call panics otherwise.
    pub fn insert_ordered(&mut self, value: usize, incr_after: usize, ignore_if_present: bool) {
        debug_assert!(self.is_ordered());

        let pos = self.0.partition_point(|&x| x < value);
        let present = self.0.get(pos) == Some(&value);
        if present {
            assert!(
                ignore_if_present,
                "value {} already present in {:?}",
                value, self
            );
            for x in &mut self.0[pos + 1..] {
                *x += incr_after;
            }
        } else {
            for x in &mut self.0[pos..] {
                *x += incr_after;
            }
            self.0.insert(pos, value);
        }
    }

    /// Insert each of `values` with [`insert_ordered`](IntSeq::insert_ordered),
    /// without shifting.
    pub fn insert_all_ordered(&mut self, values: &[usize], ignore_if_present: bool) {
        for &v in values {
            self.insert_ordered(v, 0, ignore_if_present);
        }
    }

    /// Remove `value` from an ordered sequence and subtract `decr_after` from
    /// every element after it.
    ///
    /// Panics if `value` is absent, unless `ignore_if_absent` is set.
    pub fn remove_ordered(&mut self, value: usize, decr_after: usize, ignore_if_absent: bool) {
        debug_assert!(self.is_ordered());

        let pos = self.0.partition_point(|&x| x < value);
        if self.0.get(pos) != Some(&value) {
            assert!(ignore_if_absent, "value {} not present in {:?}", value, self);
            return;
        }
        self.0.remove(pos);
        for x in &mut self.0[pos..] {
            *x -= decr_after;
        }
    }

    /// Return the first `n` elements.
    pub fn first_n(&self, n: usize) -> IntSeq {
        Self::from_slice(&self.0[..n])
    }

    /// Return the elements at `positions`.
    pub fn select(&self, positions: &[usize]) -> IntSeq {
        positions.iter().map(|&p| self.0[p]).collect()
    }

    /// Split into the first `n` elements and the rest.
    pub fn split_at(&self, n: usize) -> (IntSeq, IntSeq) {
        let (head, tail) = self.0.split_at(n);
        (Self::from_slice(head), Self::from_slice(tail))
    }

    /// Concatenate two sequences.
    pub fn cat(&self, other: &[usize]) -> IntSeq {
        self.0.iter().chain(other).copied().collect()
    }

    /// Add `k` to each element.
    pub fn add_scalar(&self, k: usize) -> IntSeq {
        self.0.iter().map(|x| x + k).collect()
    }

    /// Look up each index of `at` in `table` extended with `terminal`,
    /// skipping entries that are `None`.
    ///
    /// This re-expresses positions of one axis list (eg. cut points of an
    /// expression) in the numbering of another (eg. one of its operands), where
    /// `table[i]` is the position of axis `i` in the target numbering.
    pub fn gather_present(table: &[Option<usize>], terminal: usize, at: &[usize]) -> IntSeq {
        at.iter()
            .filter_map(|&i| {
                if i == table.len() {
                    Some(terminal)
                } else {
                    table[i]
                }
            })
            .collect()
    }

    /// Return true if `self` is a valid list of cut points for a sequence of
    /// `n` axes: strictly increasing, starting at 0 and ending at `n`.
    pub fn is_valid_cuts(&self, n: usize) -> bool {
        self.0.first() == Some(&0) && self.0.last() == Some(&n) && self.is_strictly_increasing()
    }

    /// Iterate over the ranges between consecutive elements.
    pub fn runs(&self) -> impl ExactSizeIterator<Item = Range<usize>> + '_ {
        self.0.windows(2).map(|w| w[0]..w[1])
    }
}

/// Transpose a list of equal-length sequences.
///
/// The `i`th output sequence contains the `i`th element of every input.
pub fn transpose(seqs: &[IntSeq]) -> Vec<IntSeq> {
    let Some(first) = seqs.first() else {
        return Vec::new();
    };
    assert!(
        seqs.iter().all(|s| s.len() == first.len()),
        "sequences have different lengths"
    );
    (0..first.len())
        .map(|i| seqs.iter().map(|s| s[i]).collect())
        .collect()
}

impl Deref for IntSeq {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl FromIterator<usize> for IntSeq {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> IntSeq {
        IntSeq(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for IntSeq {
    fn from(values: [usize; N]) -> IntSeq {
        IntSeq::from_slice(&values)
    }
}

impl From<&[usize]> for IntSeq {
    fn from(values: &[usize]) -> IntSeq {
        IntSeq::from_slice(values)
    }
}

impl<'a> IntoIterator for &'a IntSeq {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for IntSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use smet_testing::TestCases;

    use super::{transpose, IntSeq};

    #[test]
    fn test_constructors() {
        assert_eq!(IntSeq::up_to(4).as_slice(), &[0, 1, 2, 3]);
        assert_eq!(IntSeq::up_to(0).as_slice(), &[] as &[usize]);
        assert_eq!(IntSeq::range(1, 3, 10).as_slice(), &[1, 4, 7]);
        assert_eq!(IntSeq::range(5, 1, 5).as_slice(), &[] as &[usize]);
        assert_eq!(IntSeq::repeat(3, 7).as_slice(), &[7, 7, 7]);
    }

    #[test]
    #[should_panic(expected = "range step must be positive")]
    fn test_range_zero_step() {
        IntSeq::range(0, 0, 4);
    }

    #[test]
    fn test_queries() {
        let seq = IntSeq::from([1, 3, 3, 8]);
        assert!(seq.is_ordered());
        assert!(!seq.is_strictly_increasing());
        assert_eq!(seq.sum(), 15);
        assert_eq!(seq.product(), 72);
        assert_eq!(seq.partial_sum(2), 4);
        assert!(IntSeq::from([3, 8]).is_subset_of(&seq));
        assert!(!IntSeq::from([2]).is_subset_of(&seq));
        assert!(IntSeq::new().is_subset_of(&[]));
    }

    #[test]
    fn test_insert_ordered() {
        #[derive(Debug)]
        struct Case {
            seq: &'static [usize],
            value: usize,
            incr_after: usize,
            expected: &'static [usize],
        }

        let cases = [
            Case {
                seq: &[0, 2, 4],
                value: 3,
                incr_after: 0,
                expected: &[0, 2, 3, 4],
            },
            Case {
                seq: &[0, 2, 4],
                value: 1,
                incr_after: 1,
                expected: &[0, 1, 3, 5],
            },
            Case {
                seq: &[0, 2, 4],
                value: 2,
                incr_after: 1,
                expected: &[0, 2, 5],
            },
            Case {
                seq: &[],
                value: 5,
                incr_after: 1,
                expected: &[5],
            },
            Case {
                seq: &[1, 2],
                value: 7,
                incr_after: 1,
                expected: &[1, 2, 7],
            },
        ];

        cases.test_each(|case| {
            let mut seq = IntSeq::from_slice(case.seq);
            seq.insert_ordered(case.value, case.incr_after, true);
            assert_eq!(seq.as_slice(), case.expected);
        })
    }

    #[test]
    #[should_panic(expected = "value 2 already present in [0, 2]")]
    fn test_insert_ordered_duplicate() {
        let mut seq = IntSeq::from([0, 2]);
        seq.insert_ordered(2, 0, false);
    }

    #[test]
    fn test_remove_ordered() {
        let mut seq = IntSeq::from([0, 2, 3, 5]);
        seq.remove_ordered(2, 1, false);
        assert_eq!(seq.as_slice(), &[0, 2, 4]);

        seq.remove_ordered(1, 1, true);
        assert_eq!(seq.as_slice(), &[0, 2, 4]);
    }

    #[test]
    #[should_panic(expected = "value 1 not present")]
    fn test_remove_ordered_absent() {
        let mut seq = IntSeq::from([0, 2]);
        seq.remove_ordered(1, 0, false);
    }

    #[test]
    fn test_insert_all_ordered() {
        let mut seq = IntSeq::from([0, 4]);
        seq.insert_all_ordered(&[2, 3, 2], true);
        assert_eq!(seq.as_slice(), &[0, 2, 3, 4]);
    }

    #[test]
    fn test_filter_and_split() {
        let seq = IntSeq::from([10, 11, 12, 13]);
        assert_eq!(seq.first_n(2).as_slice(), &[10, 11]);
        assert_eq!(seq.select(&[3, 0]).as_slice(), &[13, 10]);

        let (head, tail) = seq.split_at(1);
        assert_eq!(head.as_slice(), &[10]);
        assert_eq!(tail.as_slice(), &[11, 12, 13]);
        assert_eq!(head.cat(&tail), seq);
        assert_eq!(head.add_scalar(5).as_slice(), &[15]);
    }

    #[test]
    fn test_gather_present() {
        let table = [Some(1), None, Some(0)];
        assert_eq!(
            IntSeq::gather_present(&table, 2, &[0, 1, 2, 3]).as_slice(),
            &[1, 0, 2]
        );
        assert_eq!(IntSeq::gather_present(&table, 2, &[3]).as_slice(), &[2]);
    }

    #[test]
    fn test_is_valid_cuts() {
        #[derive(Debug)]
        struct Case {
            cuts: &'static [usize],
            n: usize,
            valid: bool,
        }

        let cases = [
            Case {
                cuts: &[0, 3],
                n: 3,
                valid: true,
            },
            Case {
                cuts: &[0],
                n: 0,
                valid: true,
            },
            Case {
                cuts: &[0, 1, 1, 3],
                n: 3,
                valid: false,
            },
            Case {
                cuts: &[1, 3],
                n: 3,
                valid: false,
            },
            Case {
                cuts: &[0, 2],
                n: 3,
                valid: false,
            },
            Case {
                cuts: &[],
                n: 0,
                valid: false,
            },
        ];

        cases.test_each(|case| {
            assert_eq!(IntSeq::from_slice(case.cuts).is_valid_cuts(case.n), case.valid);
        })
    }

    #[test]
    fn test_runs() {
        let runs: Vec<_> = IntSeq::from([0, 1, 4]).runs().collect();
        assert_eq!(runs, [0..1, 1..4]);
        assert_eq!(IntSeq::from([0]).runs().count(), 0);
    }

    #[test]
    fn test_transpose() {
        let seqs = [IntSeq::from([1, 2, 3]), IntSeq::from([4, 5, 6])];
        let transposed = transpose(&seqs);
        assert_eq!(
            transposed,
            [
                IntSeq::from([1, 4]),
                IntSeq::from([2, 5]),
                IntSeq::from([3, 6])
            ]
        );
        assert_eq!(transpose(&transposed), seqs);
        assert!(transpose(&[]).is_empty());
    }
}
