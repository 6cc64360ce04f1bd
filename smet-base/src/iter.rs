//! Iterators used to split work between threads.

use std::ops::Range;

use rayon::prelude::*;

/// Iterator returned by [`range_chunks`].
///
/// Yields `n_chunks` contiguous sub-ranges which together cover the input
/// range. Chunk lengths differ by at most one, with the longer chunks first.
#[derive(Clone, Debug)]
pub struct RangeChunks {
    range: Range<usize>,
    n_chunks: usize,

    /// Index of the next chunk yielded by `next`.
    front: usize,

    /// One past the index of the next chunk yielded by `next_back`.
    back: usize,
}

impl RangeChunks {
    /// Return the `index`th chunk.
    ///
    /// Panics if `index` is not less than the total chunk count.
    pub fn chunk(&self, index: usize) -> Range<usize> {
        assert!(
            index < self.n_chunks,
            "chunk index {} out of bounds for {} chunks",
            index,
            self.n_chunks
        );
        let len = self.range.len();
        let base = len / self.n_chunks;
        let rem = len % self.n_chunks;

        let start = self.range.start + index * base + index.min(rem);
        let size = base + usize::from(index < rem);
        start..start + size
    }

    /// Process chunks in parallel using Rayon's current thread pool.
    ///
    /// `body` receives the chunk index and the chunk's range.
    pub fn par_for_each<F>(self, body: F)
    where
        F: Fn(usize, Range<usize>) + Send + Sync,
    {
        (self.front..self.back)
            .into_par_iter()
            .for_each(|idx| body(idx, self.chunk(idx)));
    }
}

impl Iterator for RangeChunks {
    type Item = Range<usize>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let chunk = self.chunk(self.front);
            self.front += 1;
            Some(chunk)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl ExactSizeIterator for RangeChunks {}

impl DoubleEndedIterator for RangeChunks {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.chunk(self.back))
        } else {
            None
        }
    }
}

impl std::iter::FusedIterator for RangeChunks {}

/// Split `range` into at most `n_chunks` contiguous, non-empty sub-ranges of
/// near-equal length.
///
/// Fewer chunks are produced if the range is shorter than `n_chunks`.
pub fn range_chunks(range: Range<usize>, n_chunks: usize) -> RangeChunks {
    let n_chunks = n_chunks.max(1).min(range.len().max(1));
    let back = if range.is_empty() { 0 } else { n_chunks };
    RangeChunks {
        range,
        n_chunks,
        front: 0,
        back,
    }
}
