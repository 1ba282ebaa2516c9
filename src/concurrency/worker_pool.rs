//! A fixed pool of long-lived workers draining a shared task queue.
//!
//! # Invariants
//!
//! - Exactly `P` workers exist for the pool's lifetime; their slot indices
//!   `0..P` are stable and are handed to every job they run.
//! - Termination is in-band: `finish_all` enqueues exactly `P` poison
//!   tasks, and each worker exits after consuming one.
//! - `execute_sync` returns only after every task it submitted has run to
//!   completion. The queue is FIFO and each worker drains sequentially, so
//!   `P` trailing barrier tasks fence all preceding work without any
//!   per-batch shared state.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use super::blocking_queue::BlockingQueue;

/// Stable identity of a pool worker: its slot index in `0..P`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerId(usize);

impl WorkerId {
    /// The worker's slot index, suitable for indexing per-worker state.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A unit of work, or the in-band stop signal.
pub enum Task {
    /// A job to run on whichever worker dequeues it.
    Run(Box<dyn FnOnce(WorkerId) + Send + 'static>),
    /// Poison: the consuming worker exits its loop.
    Exit,
}

impl Task {
    /// Wraps a job closure in a work task.
    pub fn run(job: impl FnOnce(WorkerId) + Send + 'static) -> Self {
        Task::Run(Box::new(job))
    }
}

/// A job whose borrows are confined to an `execute_sync` call.
pub type ScopedJob<'scope> = Box<dyn FnOnce(WorkerId) + Send + 'scope>;

/// A fixed set of worker threads fed from one blocking MPMC queue.
pub struct WorkerPool {
    queue: Arc<BlockingQueue<Task>>,
    /// Phase barrier of arity `P + 1`: all workers plus the coordinator.
    phase: Arc<Barrier>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `parallelism` workers, each looping on the shared queue.
    ///
    /// # Panics
    /// Panics if `parallelism` is zero or a worker thread cannot be
    /// spawned.
    pub fn new(parallelism: usize) -> Self {
        assert!(parallelism > 0, "worker pool needs at least one worker");

        let queue = Arc::new(BlockingQueue::new());
        let phase = Arc::new(Barrier::new(parallelism + 1));
        let workers = (0..parallelism)
            .map(|slot| {
                let queue = Arc::clone(&queue);
                thread::Builder::new()
                    .name(format!("lockstep-worker-{slot}"))
                    .spawn(move || worker_loop(&queue, WorkerId(slot)))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        trace!(workers = parallelism, "worker pool started");
        Self { queue, phase, workers }
    }

    /// Number of workers.
    pub fn parallelism(&self) -> usize {
        self.workers.len()
    }

    /// The stable worker identities, valid for the pool's lifetime.
    pub fn worker_ids(&self) -> impl Iterator<Item = WorkerId> {
        (0..self.workers.len()).map(WorkerId)
    }

    /// Enqueues a single fire-and-forget job.
    pub fn schedule(&self, job: impl FnOnce(WorkerId) + Send + 'static) {
        self.queue.push(Task::run(job));
    }

    /// Runs a batch of jobs and blocks until all of them have completed.
    ///
    /// The jobs are published as one contiguous FIFO run, followed by one
    /// barrier task per worker; the coordinator then waits on the same
    /// barrier. A worker can only reach its barrier task after finishing
    /// every batch job it dequeued, so when the coordinator resumes, the
    /// whole batch has run.
    ///
    /// Jobs may borrow from the caller's stack: the barrier handshake is
    /// what makes the lifetime erasure below sound.
    pub fn execute_sync<'scope>(&self, jobs: impl IntoIterator<Item = ScopedJob<'scope>>) {
        let tasks: Vec<Task> = jobs
            .into_iter()
            .map(|job| {
                // SAFETY: the job only runs on a pool worker before the
                // coordinator passes the phase barrier at the end of this
                // call, so every borrow inside it outlives its execution.
                let job: Box<dyn FnOnce(WorkerId) + Send + 'static> =
                    unsafe { mem::transmute(job) };
                Task::Run(job)
            })
            .collect();
        self.queue.push_all(tasks);

        let fences: Vec<Task> = self
            .worker_ids()
            .map(|_| {
                let phase = Arc::clone(&self.phase);
                Task::run(move |_| {
                    phase.wait();
                })
            })
            .collect();
        self.queue.push_all(fences);

        self.phase.wait();
    }

    /// Stops and joins every worker. Queued work tasks submitted before
    /// the poison run to completion first.
    pub fn finish_all(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        let n = self.workers.len();
        self.queue.push_all((0..n).map(|_| Task::Exit));
        for handle in self.workers.drain(..) {
            handle.join().expect("worker thread panicked");
        }
        debug!(workers = n, "worker pool finished");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(queue: &BlockingQueue<Task>, id: WorkerId) {
    loop {
        match queue.pop_blocking() {
            Task::Run(job) => {
                // A panicking job would strand the phase barrier and every
                // thread waiting on it; fail the whole process instead.
                if panic::catch_unwind(AssertUnwindSafe(|| job(id))).is_err() {
                    process::abort();
                }
            }
            Task::Exit => break,
        }
    }
    trace!(worker = id.index(), "worker exiting");
}
