//! A bulk-synchronous parallel-for / parallel-filter executor.
//!
//! The executor submits contiguous index batches to the worker pool and
//! fences each call with the pool's phase barrier, so `pfor` and `pfilter`
//! are synchronous: when they return, every iteration has run.
//!
//! # Invariants
//!
//! - Batches are contiguous, never interleaved; iteration within a batch
//!   is sequential and left-to-right. Callers writing at disjoint index
//!   regions may therefore assume freedom from races.
//! - The default split produces exactly `P` batches: with
//!   `n = to - from` and `s = ceil(n / P)`, the first
//!   `P - (P * s - n) mod P` batches have `s` elements and the remainder
//!   `floor(n / P)`.
//! - `pfilter` output order equals input order.
//!
//! Bodies must not panic; a panicking batch aborts the process (see the
//! worker loop). There is no error recovery.

use super::worker_pool::{ScopedJob, WorkerId, WorkerPool};

/// A parallel-for executor over a fixed worker pool.
pub struct PramExecutor {
    pool: WorkerPool,
}

impl PramExecutor {
    /// Creates an executor backed by `parallelism` pool workers.
    pub fn new(parallelism: usize) -> Self {
        Self {
            pool: WorkerPool::new(parallelism),
        }
    }

    /// Number of workers draining the executor's queue.
    pub fn parallelism(&self) -> usize {
        self.pool.parallelism()
    }

    /// The backing pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Invokes `body(i)` for every `i` in `[from, to)`, split into one
    /// contiguous batch per worker, and returns once all of them ran.
    pub fn pfor<F>(&self, from: usize, to: usize, body: F)
    where
        F: Fn(usize) + Sync,
    {
        self.pfor_with_id(from, to, move |i, _| body(i));
    }

    /// `pfor` with an explicit batch size instead of the per-worker split.
    pub fn pfor_batched<F>(&self, from: usize, to: usize, batch_size: usize, body: F)
    where
        F: Fn(usize) + Sync,
    {
        let body = &body;
        self.run_batches(batch_ranges(from, to, batch_size), &move |i, _| body(i));
    }

    /// Like `pfor`, but the body also receives the identity of the worker
    /// running it, for indexing per-worker state.
    pub fn pfor_with_id<F>(&self, from: usize, to: usize, body: F)
    where
        F: Fn(usize, WorkerId) + Sync,
    {
        self.run_batches(even_batches(from, to, self.parallelism()), &body);
    }

    fn run_batches<F>(&self, ranges: Vec<(usize, usize)>, body: &F)
    where
        F: Fn(usize, WorkerId) + Sync,
    {
        if ranges.is_empty() {
            return;
        }
        let jobs: Vec<ScopedJob<'_>> = ranges
            .into_iter()
            .map(|(lo, hi)| {
                Box::new(move |id: WorkerId| {
                    for i in lo..hi {
                        body(i, id);
                    }
                }) as ScopedJob<'_>
            })
            .collect();
        self.pool.execute_sync(jobs);
    }

    /// Keeps the elements satisfying `predicate`, preserving input order.
    ///
    /// The input splits into one contiguous shard per worker; each batch
    /// task owns its shard's output list, appending matches in input
    /// order. Concatenating the lists in shard order yields the filtered
    /// input in its original order.
    pub fn pfilter<T, P>(&self, items: &[T], predicate: P) -> Vec<T>
    where
        T: Clone + Send + Sync,
        P: Fn(&T) -> bool + Sync,
    {
        let mut shards: Vec<Vec<T>> = (0..self.parallelism()).map(|_| Vec::new()).collect();

        if !items.is_empty() {
            let predicate = &predicate;
            let jobs: Vec<ScopedJob<'_>> = shards
                .iter_mut()
                .zip(even_batches(0, items.len(), self.parallelism()))
                .map(|(shard, (lo, hi))| {
                    Box::new(move |_id: WorkerId| {
                        for item in &items[lo..hi] {
                            if predicate(item) {
                                shard.push(item.clone());
                            }
                        }
                    }) as ScopedJob<'_>
                })
                .collect();
            self.pool.execute_sync(jobs);
        }

        shards.into_iter().flatten().collect()
    }

    /// Stops and joins the backing pool.
    pub fn finish_all(self) {
        self.pool.finish_all();
    }
}

/// Splits `[from, to)` into exactly `n_batches` contiguous half-open
/// ranges whose sizes differ by at most one, larger batches first.
/// Trailing batches are empty when the range has fewer elements than
/// batches.
fn even_batches(from: usize, to: usize, n_batches: usize) -> Vec<(usize, usize)> {
    assert!(n_batches > 0, "batch count must be positive");
    let n = to.saturating_sub(from);
    if n == 0 {
        return Vec::new();
    }
    let size = n.div_ceil(n_batches);
    let n_full = n_batches - (n_batches * size - n) % n_batches;

    let mut ranges = Vec::with_capacity(n_batches);
    let mut lo = from;
    for batch_id in 0..n_batches {
        let hi = lo + size - usize::from(batch_id >= n_full);
        ranges.push((lo, hi));
        lo = hi;
    }
    debug_assert_eq!(lo, to);
    ranges
}

/// Splits `[from, to)` into contiguous ranges of `batch_size` elements,
/// with one short tail batch when the size does not divide the range.
fn batch_ranges(from: usize, to: usize, batch_size: usize) -> Vec<(usize, usize)> {
    assert!(batch_size > 0, "batch size must be positive");
    let n = to.saturating_sub(from);
    if n == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::with_capacity(n.div_ceil(batch_size));
    let mut lo = from;
    while lo < to {
        let hi = usize::min(lo + batch_size, to);
        ranges.push((lo, hi));
        lo = hi;
    }
    ranges
}
