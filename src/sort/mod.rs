//! Sequential and task-queue-parallel quicksort.

pub mod parallel;
pub mod sequential;

pub use parallel::{ParallelSorter, PARALLEL_CUTOFF};
pub use sequential::{partition, sort_sequential};
