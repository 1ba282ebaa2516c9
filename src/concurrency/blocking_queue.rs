//! A blocking, unbounded Multi-Producer Multi-Consumer (MPMC) FIFO queue.
//!
//! # Invariants
//!
//! - Elements leave in the order they entered, across all producers.
//! - `push_all` publishes its elements as one contiguous run: no other
//!   `push`/`push_all` can interleave inside it.
//! - The condvar signals non-emptiness; notification happens after the
//!   queue lock has been released.
//!
//! There is no closed or drained state. Consumers that must stop are told
//! so in-band (see the worker pool's poison task).

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// An unbounded MPMC FIFO queue with blocking and non-blocking dequeue.
pub struct BlockingQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Enqueues a single element at the tail.
    pub fn push(&self, value: T) {
        let mut queue = self.inner.lock();
        queue.push_back(value);
        drop(queue);
        self.not_empty.notify_one();
    }

    /// Enqueues every element of `values` as one contiguous run.
    ///
    /// Holding the lock across the whole extension is what makes the run
    /// contiguous with respect to concurrent producers.
    pub fn push_all<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut queue = self.inner.lock();
        queue.extend(values);
        drop(queue);
        self.not_empty.notify_all();
    }

    /// Dequeues the head element, blocking until one is available.
    pub fn pop_blocking(&self) -> T {
        let mut queue = self.inner.lock();
        loop {
            if let Some(value) = queue.pop_front() {
                return value;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    /// Dequeues the head element, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// Number of queued elements at the moment of the call.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue was empty at the moment of the call.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fifo_order_single_thread() {
        let q = BlockingQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop_blocking(), 1);
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.pop_blocking(), 3);
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn try_pop_on_empty_returns_none() {
        let q: BlockingQueue<i32> = BlockingQueue::new();
        assert!(q.try_pop().is_none());
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn push_all_is_contiguous() {
        let q = BlockingQueue::new();

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..50 {
                    q.push_all((0..20).map(|i| ('a', i)));
                }
            });
            s.spawn(|| {
                for _ in 0..50 {
                    q.push_all((0..20).map(|i| ('b', i)));
                }
            });
        });

        let mut drained = Vec::new();
        while let Some(v) = q.try_pop() {
            drained.push(v);
        }
        assert_eq!(drained.len(), 2000);

        // Each run of 20 must be unbroken: same tag, indices 0..20 in order.
        for run in drained.chunks(20) {
            let tag = run[0].0;
            for (i, &(t, j)) in run.iter().enumerate() {
                assert_eq!(t, tag);
                assert_eq!(j, i);
            }
        }
    }

    #[test]
    fn mpmc_transfers_every_element() {
        let q = BlockingQueue::new();
        let total: i64 = (0..4000).sum();

        thread::scope(|s| {
            for p in 0..4 {
                let q = &q;
                s.spawn(move || {
                    for i in 0..1000 {
                        q.push(i64::from(p) * 1000 + i);
                    }
                });
            }

            let mut handles = Vec::new();
            for _ in 0..2 {
                let q = &q;
                handles.push(s.spawn(move || {
                    let mut sum = 0i64;
                    for _ in 0..2000 {
                        sum += q.pop_blocking();
                    }
                    sum
                }));
            }
            let got: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
            assert_eq!(got, total);
        });
    }

    #[test]
    fn pop_blocking_wakes_on_push() {
        let q = BlockingQueue::new();
        thread::scope(|s| {
            let consumer = s.spawn(|| q.pop_blocking());
            thread::sleep(std::time::Duration::from_millis(20));
            q.push(7);
            assert_eq!(consumer.join().unwrap(), 7);
        });
    }
}
