//! Sequential block sub-ranges over a closed-open interval

use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Splits `[offset, end)` into consecutive sub-ranges of `batch_size` blocks
///
/// The step is re-read on every call, so a resizer holding
/// [`batch_size_handle`](Self::batch_size_handle) can change it mid-iteration. A step
/// of zero is treated as one block.
///
/// # Example
///
/// ```
/// use hypersync_stream::stream::BlockIterator;
///
/// let ranges: Vec<_> = BlockIterator::new(100, 150, 25).collect();
/// assert_eq!(ranges, vec![100..125, 125..150]);
/// ```
#[derive(Debug, Clone)]
pub struct BlockIterator {
    offset: u64,
    end: u64,
    batch_size: Arc<AtomicU64>,
}

impl BlockIterator {
    /// Iterator over `[offset, end)` with its own step
    pub fn new(offset: u64, end: u64, batch_size: u64) -> Self {
        Self::with_shared_batch_size(offset, end, Arc::new(AtomicU64::new(batch_size)))
    }

    /// Iterator over `[offset, end)` reading its step from a shared cell
    pub fn with_shared_batch_size(offset: u64, end: u64, batch_size: Arc<AtomicU64>) -> Self {
        Self {
            offset: offset.min(end),
            end,
            batch_size,
        }
    }

    /// True once every block up to `end` has been handed out
    pub fn completed(&self) -> bool {
        self.offset >= self.end
    }

    /// Start of the next sub-range
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Exclusive end of the whole interval
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Change the step for all following sub-ranges
    pub fn set_batch_size(&self, batch_size: u64) {
        self.batch_size.store(batch_size, Ordering::Relaxed);
    }

    /// Shared step cell, for resizing from another task
    pub fn batch_size_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.batch_size)
    }
}

impl Iterator for BlockIterator {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.completed() {
            return None;
        }
        let step = self.batch_size.load(Ordering::Relaxed).max(1);
        let start = self.offset;
        let stop = start.saturating_add(step).min(self.end);
        self.offset = stop;
        Some(start..stop)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.completed() {
            return (0, Some(0));
        }
        // The step may change between calls, so only the lower bound of one is exact
        (1, usize::try_from(self.end - self.offset).ok())
    }
}

impl FusedIterator for BlockIterator {}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_into_steps() {
        let ranges: Vec<_> = BlockIterator::new(100, 150, 25).collect();
        assert_eq!(ranges, vec![100..125, 125..150]);
    }

    #[test]
    fn test_last_range_is_clamped() {
        let ranges: Vec<_> = BlockIterator::new(0, 10, 4).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_ranges_tile_the_interval() {
        for (start, end, step) in [(0u64, 1u64, 1u64), (7, 1_000, 33), (5, 6, 100), (0, 999, 1_000)] {
            let ranges: Vec<_> = BlockIterator::new(start, end, step).collect();
            assert_eq!(ranges.first().unwrap().start, start);
            assert_eq!(ranges.last().unwrap().end, end);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start, "gap or overlap in {ranges:?}");
            }
            assert!(ranges.iter().all(|r| r.end - r.start <= step && !r.is_empty()));
        }
    }

    #[test]
    fn test_empty_interval_is_completed() {
        let mut it = BlockIterator::new(50, 50, 10);
        assert!(it.completed());
        assert_eq!(it.next(), None);

        let mut inverted = BlockIterator::new(60, 50, 10);
        assert!(inverted.completed());
        assert_eq!(inverted.next(), None);
    }

    #[test]
    fn test_fused_after_completion() {
        let mut it = BlockIterator::new(0, 3, 5);
        assert_eq!(it.next(), Some(0..3));
        assert!(it.completed());
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
        assert_eq!(it.offset(), 3);
    }

    #[test]
    fn test_zero_step_still_progresses() {
        let ranges: Vec<_> = BlockIterator::new(0, 3, 0).collect();
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_resize_applies_to_next_range() {
        let mut it = BlockIterator::new(0, 100, 10);
        assert_eq!(it.next(), Some(0..10));

        it.set_batch_size(50);
        assert_eq!(it.next(), Some(10..60));

        let handle = it.batch_size_handle();
        handle.store(5, Ordering::Relaxed);
        assert_eq!(it.next(), Some(60..65));
    }

    #[test]
    fn test_near_u64_max_does_not_overflow() {
        let ranges: Vec<_> = BlockIterator::new(u64::MAX - 3, u64::MAX, 10).collect();
        assert_eq!(ranges, vec![u64::MAX - 3..u64::MAX]);
    }
}
