//! History records, the linearizability checker, and randomized test
//! scaffolding.

pub mod array_util;
pub mod harness;
pub mod history;
pub mod linearize;

pub use array_util::{generate_array, is_sorted};
pub use harness::{rand_test, DurationSeconds, Repeats, StopCondition, WeightedOutcome};
pub use history::{History, OpKind, Operation};
pub use linearize::{history_is_linearizable, HistoryViolation};
