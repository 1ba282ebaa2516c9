//! A randomized operation dispatcher for stress tests.
//!
//! Given a stop condition, a common postcondition, and weighted
//! operations, [`rand_test`] repeatedly draws an operation proportionally
//! to its weight, runs it, and asserts both the operation's own check and
//! the common postcondition. Each call is single-threaded; concurrent
//! stress comes from the caller running one harness per thread.

use std::time::{Duration, Instant};

use rand::distributions::{Distribution, WeightedIndex};

/// When a randomized run should stop.
pub trait StopCondition {
    /// Rearms the condition before a run.
    fn reset(&mut self) {}
    /// `true` while the run should continue; called once per iteration.
    fn check(&mut self) -> bool;
}

/// Stop after a fixed number of iterations.
pub struct Repeats {
    total: usize,
    done: usize,
}

impl Repeats {
    /// Runs for exactly `total` iterations.
    pub fn new(total: usize) -> Self {
        Self { total, done: 0 }
    }
}

impl StopCondition for Repeats {
    fn reset(&mut self) {
        self.done = 0;
    }

    fn check(&mut self) -> bool {
        let go = self.done < self.total;
        self.done += 1;
        go
    }
}

/// Stop once a wall-clock duration has elapsed.
pub struct DurationSeconds {
    limit: Duration,
    started: Instant,
}

impl DurationSeconds {
    /// Runs for `seconds` of wall time.
    pub fn new(seconds: u64) -> Self {
        Self {
            limit: Duration::from_secs(seconds),
            started: Instant::now(),
        }
    }
}

impl StopCondition for DurationSeconds {
    fn reset(&mut self) {
        self.started = Instant::now();
    }

    fn check(&mut self) -> bool {
        self.started.elapsed() < self.limit
    }
}

/// An operation with its selection weight. The closure reports whether
/// the operation's own postcondition held.
pub struct WeightedOutcome<'a> {
    weight: u32,
    run: Box<dyn FnMut() -> bool + 'a>,
}

impl<'a> WeightedOutcome<'a> {
    /// Pairs a weight with an operation. Zero weights are allowed as long
    /// as some outcome has a positive one.
    pub fn new(weight: u32, run: impl FnMut() -> bool + 'a) -> Self {
        Self { weight, run: Box::new(run) }
    }
}

/// Runs weighted operations until the stop condition trips.
///
/// # Panics
/// Panics when an operation or the common postcondition reports failure,
/// when `outcomes` is empty, or when every weight is zero.
pub fn rand_test(
    stop: &mut dyn StopCondition,
    mut common_postcondition: impl FnMut() -> bool,
    outcomes: &mut [WeightedOutcome<'_>],
) {
    assert!(!outcomes.is_empty(), "rand_test needs at least one outcome");
    let dist = WeightedIndex::new(outcomes.iter().map(|o| o.weight))
        .expect("outcome weights must sum to a positive value");
    let mut rng = rand::thread_rng();

    stop.reset();
    while stop.check() {
        let picked = dist.sample(&mut rng);
        assert!((outcomes[picked].run)(), "randomized operation reported failure");
        assert!(common_postcondition(), "common postcondition violated");
    }
}
