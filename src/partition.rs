//! Splits the rows of an image into contiguous, non-overlapping
//! ranges, one per worker.

use itertools::Itertools;

use crate::errors::{RenderError, Result};

/// Used when the host will not say how many CPUs it has.
pub const DEFAULT_WORKERS: usize = 4;

/// The most threads a single render may ask for.
pub const MAX_WORKERS: usize = 256;

/// An inclusive span of rows assigned to one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowRange {
    /// First row.
    pub start: u32,
    /// Last row, inclusive.
    pub end: u32,
}

impl RowRange {
    /// Both bounds are inclusive.
    pub fn new(start: u32, end: u32) -> RowRange {
        RowRange { start, end }
    }

    /// The rows in this range, in ascending order.
    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Number of rows covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Never true for a range built by `partition`.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// The number of workers to use when the caller does not say:
/// the host's logical CPU count, up to `MAX_WORKERS`.
pub fn default_workers() -> usize {
    match num_cpus::get() {
        0 => DEFAULT_WORKERS,
        n => n.min(MAX_WORKERS),
    }
}

/// Given the total row count and the number of workers, hand each
/// worker `ceil(height / workers)` consecutive rows, the last worker
/// taking whatever is left.  Workers that would start past the end of
/// the image get nothing, so fewer than `workers` ranges come back when
/// there are more workers than rows.  Zero workers is treated as one.
pub fn partition(height: u32, workers: usize) -> Vec<RowRange> {
    if height == 0 {
        return vec![];
    }
    let height = u64::from(height);
    // Past one worker per row the ranges are the same, and the clamp
    // keeps the ceiling division below from overflowing.
    let workers = (workers.max(1) as u64).min(height);
    let per_worker = (height + workers - 1) / workers;
    (0..workers)
        .map(|w| w * per_worker)
        .take_while(|&start| start < height)
        .map(|start| {
            let end = (start + per_worker - 1).min(height - 1);
            RowRange::new(start as u32, end as u32)
        })
        .collect()
}

/// Rejects worker counts above `MAX_WORKERS`; each worker is an OS
/// thread.
pub fn check_workers(workers: usize) -> Result<()> {
    if workers > MAX_WORKERS {
        return Err(RenderError::InvalidParameter {
            name: "workers".to_string(),
            value: workers.to_string(),
        });
    }
    Ok(())
}

/// Confirms the ranges cover `[0, height)` exactly once, in ascending
/// order.
pub fn check_partition(ranges: &[RowRange], height: u32) -> Result<()> {
    let covered: u64 = ranges
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| u64::from(r.len()))
        .sum();
    let well_formed = ranges.iter().all(|r| !r.is_empty());
    let adjacent = ranges
        .iter()
        .tuple_windows()
        .all(|(a, b)| u64::from(a.end) + 1 == u64::from(b.start));
    let anchored = match (ranges.first(), ranges.last()) {
        (Some(first), Some(last)) => first.start == 0 && u64::from(last.end) + 1 == u64::from(height),
        _ => height == 0,
    };
    if well_formed && adjacent && anchored && covered == u64::from(height) {
        Ok(())
    } else {
        Err(RenderError::IncompletePartition { height, covered })
    }
}
