//! Task queue, worker pool, and bulk-synchronous executor.
//!
//! The layering is strict: the [`BlockingQueue`] knows nothing about
//! workers, the [`WorkerPool`] owns the queue plus a `P + 1`-arity phase
//! barrier, and the [`PramExecutor`] expresses `pfor`/`pfilter` purely in
//! terms of pool batches fenced by that barrier.

pub mod blocking_queue;
pub mod executor;
pub mod worker_pool;

pub use blocking_queue::BlockingQueue;
pub use executor::PramExecutor;
pub use worker_pool::{ScopedJob, Task, WorkerId, WorkerPool};
