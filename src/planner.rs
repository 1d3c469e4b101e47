//! Row partitioning for one benchmark pass.
//!
//! A plan is the ordered list of half-open row ranges that the dispatcher hands
//! to worker tasks. Every task writes only the output rows of its own range, so
//! the whole pass is race-free exactly when the plan partitions `[0, n)`:
//! ranges start at 0, are contiguous, never overlap, and the last one ends at
//! `n`. [`plan`] always produces such a list; [`is_partition`] checks it for
//! plans built elsewhere.

use std::ops::Range;

/// Half-open row interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    pub start: usize,
    pub end: usize,
}

impl ChunkRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "chunk start {start} exceeds end {end}");
        Self { start, end }
    }

    /// Number of rows in the chunk.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<ChunkRange> for Range<usize> {
    fn from(range: ChunkRange) -> Self {
        range.rows()
    }
}

/// Splits `[0, n)` into chunks of `chunk_size` rows.
///
/// `chunk_size` is clamped to `[1, n]` first. The final chunk is shorter when
/// `chunk_size` does not divide `n`. An empty matrix yields an empty plan.
///
/// # Examples
///
/// ```
/// use parscale::planner::{plan, ChunkRange};
///
/// let ranges = plan(10, 4);
/// assert_eq!(
///     ranges,
///     vec![ChunkRange::new(0, 4), ChunkRange::new(4, 8), ChunkRange::new(8, 10)]
/// );
/// ```
pub fn plan(n: usize, chunk_size: usize) -> Vec<ChunkRange> {
    if n == 0 {
        return Vec::new();
    }

    let chunk = chunk_size.clamp(1, n);

    (0..n)
        .step_by(chunk)
        .map(|start| ChunkRange::new(start, (start + chunk).min(n)))
        .collect()
}

/// Returns `true` when `ranges` exactly partitions `[0, n)` in order.
pub fn is_partition(n: usize, ranges: &[ChunkRange]) -> bool {
    let mut expected_start = 0;
    for range in ranges {
        if range.start != expected_start || range.end <= range.start {
            return false;
        }
        expected_start = range.end;
    }
    expected_start == n
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_division() {
        let ranges = plan(256, 128);
        assert_eq!(ranges, vec![ChunkRange::new(0, 128), ChunkRange::new(128, 256)]);
    }

    #[test]
    fn test_short_tail() {
        let ranges = plan(130, 64);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2], ChunkRange::new(128, 130));
        assert_eq!(ranges[2].len(), 2);
    }

    #[test]
    fn test_chunk_larger_than_n() {
        assert_eq!(plan(128, 4096), vec![ChunkRange::new(0, 128)]);
    }

    #[test]
    fn test_zero_chunk_is_clamped_to_one() {
        let ranges = plan(5, 0);
        assert_eq!(ranges.len(), 5);
        assert!(ranges.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_empty_matrix() {
        assert!(plan(0, 128).is_empty());
        assert!(is_partition(0, &[]));
    }

    #[test]
    fn test_is_partition_rejects_gaps_and_overlaps() {
        let gap = [ChunkRange::new(0, 4), ChunkRange::new(5, 8)];
        let overlap = [ChunkRange::new(0, 5), ChunkRange::new(4, 8)];
        let short = [ChunkRange::new(0, 4)];
        let empty_chunk = [ChunkRange::new(0, 0), ChunkRange::new(0, 8)];
        assert!(!is_partition(8, &gap));
        assert!(!is_partition(8, &overlap));
        assert!(!is_partition(8, &short));
        assert!(!is_partition(8, &empty_chunk));
    }

    proptest! {
        #[test]
        fn prop_plan_partitions_rows(n in 1usize..5000, chunk_size in 0usize..6000) {
            let ranges = plan(n, chunk_size);
            let chunk = chunk_size.clamp(1, n);

            prop_assert!(is_partition(n, &ranges));
            prop_assert_eq!(ranges.len(), n.div_ceil(chunk));
            prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
            prop_assert_eq!(ranges.last().map(|r| r.end), Some(n));
            prop_assert!(ranges.iter().all(|r| r.len() <= chunk));
        }
    }
}
