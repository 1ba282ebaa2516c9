//! # `lockstep` - Barrier-Synchronized Parallelism Workbench
//!
//! A workbench for barrier-synchronized parallelism and fine-grained
//! concurrent data structures: a blocking MPMC task queue feeding a fixed
//! worker pool, a PRAM-style `pfor`/`pfilter` executor fenced by a phase
//! barrier, a task-queue parallel quicksort, a level-synchronous parallel
//! BFS over implicit graphs, a hand-over-hand-locked external BST with
//! timestamped operations, and an offline linearizability checker for the
//! histories it produces.
//!
//! ## Architecture
//!
//! The concurrency core is layered: the queue knows nothing about
//! workers, the pool owns the queue plus a reusable barrier of arity
//! `P + 1`, and the executor expresses bulk-synchronous iteration purely
//! as pool batches fenced by that barrier. The sorter bypasses the
//! barrier and drains the queue directly; BFS and the filter build on the
//! executor; the BST is independent of all of them and is exercised by
//! the randomized harness in `testing`.
//!
//! ## Example
//!
//! ```rust
//! use lockstep::PramExecutor;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! let executor = PramExecutor::new(4);
//! let cells: Vec<AtomicU64> = (0..100).map(|_| AtomicU64::new(0)).collect();
//!
//! // Batches write at disjoint indices, so no iteration races another.
//! executor.pfor(0, 100, |i| {
//!     cells[i].store(i as u64 * 2, Ordering::Relaxed);
//! });
//!
//! assert_eq!(cells[21].load(Ordering::Relaxed), 42);
//! executor.finish_all();
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;
pub mod graph;
pub mod sort;
pub mod testing;

pub use collections::ExternalBst;
pub use concurrency::{BlockingQueue, PramExecutor, WorkerId, WorkerPool};
pub use graph::{Adjacency, CubicGraph, DenseGraph, Edge};
pub use sort::{sort_sequential, ParallelSorter};
pub use testing::{history_is_linearizable, History, Operation};

// Compile-time layout checks for the hot-path types.
const _: () = {
    use core::mem;

    // Worker identities travel through every task invocation.
    assert!(mem::size_of::<WorkerId>() == mem::size_of::<usize>());

    // Edges are materialized in bulk; keep them two words at most.
    assert!(mem::size_of::<Edge>() == 8);
    assert!(mem::align_of::<Edge>() == 4);
};
