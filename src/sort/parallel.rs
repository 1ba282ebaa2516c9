//! Task-queue parallel quicksort.
//!
//! Range tasks go through a [`BlockingQueue`] shared by the calling
//! thread and `threads - 1` scoped workers. Each worker loops on a
//! non-blocking pop: partition the range, push the two outer subranges,
//! repeat; a range below the cutoff is handed to the sequential leaf.
//! A worker exits when the pop reads empty.
//!
//! No barrier is needed for termination: a task's subranges are pushed
//! before its worker pops again, so outstanding work only reaches zero
//! once the slice is fully sorted. A worker that reads an empty queue
//! while another worker still holds an in-flight task exits early and
//! leaves the remainder to the holders, which costs parallelism, never
//! correctness.

use std::slice;
use std::thread;

use crate::concurrency::BlockingQueue;

use super::sequential::{partition, random_pivot, sort_sequential};

/// Ranges shorter than this are sorted by the sequential leaf.
pub const PARALLEL_CUTOFF: usize = 1000;

/// A half-open index range of the slice being sorted.
struct SortTask {
    lo: usize,
    hi: usize,
}

/// A parallel quicksort over a fixed number of threads.
pub struct ParallelSorter {
    threads: usize,
    cutoff: usize,
}

impl ParallelSorter {
    /// A sorter fanning out over `threads` threads (the caller included).
    ///
    /// # Panics
    /// Panics if `threads` is zero.
    pub fn new(threads: usize) -> Self {
        Self::with_cutoff(threads, PARALLEL_CUTOFF)
    }

    /// A sorter with an explicit sequential-leaf cutoff.
    pub fn with_cutoff(threads: usize, cutoff: usize) -> Self {
        assert!(threads > 0, "parallel sort needs at least one thread");
        Self { threads, cutoff }
    }

    /// Sorts the slice in ascending order.
    pub fn sort<T>(&self, data: &mut [T])
    where
        T: Copy + Ord + Send + Sync,
    {
        if data.len() < 2 {
            return;
        }
        let queue = BlockingQueue::new();
        queue.push(SortTask { lo: 0, hi: data.len() });
        let base = SlicePtr::new(data);

        // Drain in-line first so the queue holds enough subtasks to feed
        // every thread before any of them can observe it empty.
        drain(&queue, &base, self.cutoff, 3 * self.threads);

        thread::scope(|s| {
            for _ in 1..self.threads {
                let queue = &queue;
                let base = &base;
                let cutoff = self.cutoff;
                s.spawn(move || drain(queue, base, cutoff, usize::MAX));
            }
            drain(&queue, &base, self.cutoff, usize::MAX);
        });
    }
}

/// A `Sync` handle to the slice under sort.
///
/// Tasks in the queue always carry pairwise-disjoint ranges: the root
/// task covers the whole slice, and a partition step replaces a range
/// with two disjoint, non-adjacent subranges of it. Reconstituting a
/// subslice per task is therefore sound even though workers share the
/// base pointer.
struct SlicePtr<T> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Send> Send for SlicePtr<T> {}
unsafe impl<T: Send> Sync for SlicePtr<T> {}

impl<T> SlicePtr<T> {
    fn new(data: &mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
        }
    }

    /// # Safety
    /// `[lo, hi)` must be in bounds and disjoint from every range
    /// concurrently handed out by this function.
    unsafe fn range(&self, lo: usize, hi: usize) -> &mut [T] {
        debug_assert!(lo <= hi && hi <= self.len);
        unsafe { slice::from_raw_parts_mut(self.ptr.add(lo), hi - lo) }
    }
}

fn drain<T>(queue: &BlockingQueue<SortTask>, base: &SlicePtr<T>, cutoff: usize, limit: usize)
where
    T: Copy + Ord,
{
    let mut iterations = 0;
    while iterations < limit {
        let Some(task) = queue.try_pop() else { break };
        iterations += 1;

        // SAFETY: queue tasks partition the slice into disjoint ranges.
        let chunk = unsafe { base.range(task.lo, task.hi) };
        if chunk.len() < cutoff {
            sort_sequential(chunk);
            continue;
        }
        let pivot = random_pivot(chunk);
        let (less_end, greater_begin) = partition(chunk, pivot);
        queue.push(SortTask { lo: task.lo, hi: task.lo + less_end });
        queue.push(SortTask { lo: task.lo + greater_begin, hi: task.hi });
    }
}
