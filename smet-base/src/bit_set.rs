/// Set of small non-negative integers, stored as a 64-bit mask.
///
/// Used to record which operands of an n-ary expression contain a given
/// axis.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitSet(u64);

impl BitSet {
    pub const BITS: usize = u64::BITS as usize;

    /// Return an empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Add `pos` to the set.
    ///
    /// Panics if `pos >= BitSet::BITS`.
    pub fn insert(&mut self, pos: usize) {
        assert!(pos < Self::BITS, "bit position {} out of range", pos);
        self.0 |= 1 << pos
    }

    /// Return true if `pos` is in the set.
    pub fn contains(&self, pos: usize) -> bool {
        pos < Self::BITS && self.0 & (1 << pos) != 0
    }

    /// Return the number of elements in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Return an iterator over the elements, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::BITS).filter(|&pos| self.contains(pos))
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet::empty();
        for pos in iter {
            set.insert(pos);
        }
        set
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::BitSet;

    #[test]
    fn test_bit_set() {
        let mut set = BitSet::empty();
        assert!(set.is_empty());

        set.insert(0);
        set.insert(5);
        set.insert(5);
        assert_eq!(set.len(), 2);
        assert!(set.contains(5));
        assert!(!set.contains(1));
        assert!(!set.contains(100));
        assert_eq!(set.iter().collect::<Vec<_>>(), [0, 5]);
        assert_eq!(format!("{:?}", set), "{0, 5}");
    }

    #[test]
    fn test_bit_set_eq() {
        let a: BitSet = [1, 2].into_iter().collect();
        let b: BitSet = [2, 1].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, BitSet::empty());
    }

    #[test]
    #[should_panic(expected = "bit position 64 out of range")]
    fn test_bit_set_insert_out_of_range() {
        BitSet::empty().insert(64);
    }
}
