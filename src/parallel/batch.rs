//! Trial batching for parallel simulation.
//!
//! The trial range is split into contiguous batches; each batch runs on one Rayon task
//! with its own copy of the combatants. Results come back in trial order regardless of
//! which worker finished first.

use std::ops::Range;

use rayon::prelude::*;

/// Batches per worker thread, so uneven trial costs still balance out.
const BATCHES_PER_WORKER: usize = 4;

/// Split `total` trials into up to `num_batches` ranges.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use mathhammer::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![0..25, 25..50, 50..75, 75..100]);
/// ```
pub fn batch_ranges(total: u64, num_batches: usize) -> Vec<Range<u64>> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = (num_batches as u64).min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches as usize);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + u64::from(i < remainder);
        let end = start + size;
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Batch count for the current Rayon pool.
/// Call inside [WorkerPool::install](super::WorkerPool::install).
pub fn batches_for_current_pool() -> usize {
    rayon::current_num_threads().max(1) * BATCHES_PER_WORKER
}

/// Run `run_batch` over every range in parallel and concatenate the results in range order.
pub fn map_batches<T, F>(ranges: Vec<Range<u64>>, run_batch: F) -> Vec<T>
where
    T: Send,
    F: Fn(Range<u64>) -> Vec<T> + Sync + Send,
{
    ranges
        .into_par_iter()
        .map(run_batch)
        .collect::<Vec<Vec<T>>>()
        .into_iter()
        .flatten()
        .collect()
}
