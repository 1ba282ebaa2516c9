//! Timestamped operation records for concurrent set histories.

use serde::Serialize;

/// The kind of a set operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OpKind {
    /// Add a key to the set.
    Insert,
    /// Take a key out of the set.
    Remove,
    /// Observe membership of a key.
    Contains,
}

/// One recorded operation of one thread.
///
/// `entry` is the timestamp drawn under the structure's root lock when
/// the operation began. The exit moment is not recorded: for checking, an
/// operation is considered live until the same thread's next operation
/// enters (and forever, for its last one).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Operation<K> {
    /// What the operation did.
    pub kind: OpKind,
    /// The key it acted on.
    pub key: K,
    /// Entry timestamp.
    pub entry: u64,
    /// The observed answer; meaningful for [`OpKind::Contains`] only.
    pub found: bool,
}

impl<K> Operation<K> {
    /// An insert record.
    pub fn insert(key: K, entry: u64) -> Self {
        Self { kind: OpKind::Insert, key, entry, found: false }
    }

    /// A remove record.
    pub fn remove(key: K, entry: u64) -> Self {
        Self { kind: OpKind::Remove, key, entry, found: false }
    }

    /// A contains record with its observation.
    pub fn contains(key: K, entry: u64, found: bool) -> Self {
        Self { kind: OpKind::Contains, key, entry, found }
    }
}

/// Everything a run produced: the prepopulated keys and each thread's
/// operations in program order.
#[derive(Clone, Debug, Serialize)]
pub struct History<K> {
    /// Keys present before any recorded operation ran.
    pub initial: Vec<K>,
    /// Per-thread operation lists, ordered by entry timestamp.
    pub per_thread: Vec<Vec<Operation<K>>>,
}
