//! An offline linearizability checker for concurrent set histories.
//!
//! The checker sweeps the history as a sequence of entry and exit events
//! and greedily maintains the one abstract set every witness must agree
//! on. Operations that overlap an insert/remove on the same key open an
//! "uncertainty window" for that key: while the window is open, the key's
//! membership depends on how a witness orders the overlapping operations,
//! so a concurrent `contains` observation on it can never refute
//! linearizability and is dropped. An observation on a key with no open
//! window, however, must match the committed set exactly; a mismatch is a
//! violation, reported together with the operation that last committed
//! the key.
//!
//! Completeness for set histories rests on two facts: operations on
//! distinct keys commute, and entry timestamps are totally ordered, so a
//! witness can always place every non-overlapping operation at its entry
//! point.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

use super::history::{History, OpKind, Operation};

/// Proof that a history admits no sequential witness.
#[derive(Debug, Error)]
#[error(
    "contains({key:?}) entering at {entry} on thread {thread} observed {observed}, \
     which no witness order explains (last commit on the key: {last_commit:?})"
)]
pub struct HistoryViolation<K: fmt::Debug> {
    /// Thread that ran the contradicted observation.
    pub thread: usize,
    /// Entry timestamp of the observation.
    pub entry: u64,
    /// The key observed.
    pub key: K,
    /// What the observation reported.
    pub observed: bool,
    /// The other half of the witness pair: the operation whose commit the
    /// observation contradicts, if any operation committed the key.
    pub last_commit: Option<Operation<K>>,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Entry,
    Exit,
}

#[derive(Clone, Copy)]
struct Event {
    time: u64,
    kind: EventKind,
    thread: usize,
    index: usize,
}

/// Decides whether `history` is linearizable with respect to a set.
///
/// The exit time of an operation is taken to be the entry time of the
/// same thread's next operation, `u64::MAX` for its last. Ties between
/// an exit and an entry at the same timestamp process the entry first;
/// exit events carry their operation, so a late exit still resolves the
/// right one.
pub fn history_is_linearizable<K>(history: &History<K>) -> Result<(), HistoryViolation<K>>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    let threads = history.per_thread.len();
    let mut events = Vec::with_capacity(2 * history.per_thread.iter().map(Vec::len).sum::<usize>());
    for (thread, ops) in history.per_thread.iter().enumerate() {
        for (index, op) in ops.iter().enumerate() {
            events.push(Event { time: op.entry, kind: EventKind::Entry, thread, index });
            let exit = ops.get(index + 1).map_or(u64::MAX, |next| next.entry);
            events.push(Event { time: exit, kind: EventKind::Exit, thread, index });
        }
    }
    events.sort_unstable_by_key(|e| (e.time, e.kind, e.thread, e.index));

    let mut committed: HashSet<K> = history.initial.iter().cloned().collect();
    // key -> latest exit time up to which its membership is undetermined
    let mut pending: HashMap<K, u64> = HashMap::new();
    let mut active: Vec<Option<usize>> = vec![None; threads];
    let mut cancelled: Vec<Vec<bool>> =
        history.per_thread.iter().map(|ops| vec![false; ops.len()]).collect();
    let mut last_commit: HashMap<K, Operation<K>> = HashMap::new();

    for event in events {
        let op = &history.per_thread[event.thread][event.index];
        match event.kind {
            EventKind::Entry => {
                active[event.thread] = Some(event.index);
                match op.kind {
                    OpKind::Insert => {
                        if concurrent_ops(history, &active, OpKind::Remove, &op.key) > 0
                            || !committed.contains(&op.key)
                        {
                            pending.entry(op.key.clone()).or_insert(0);
                        }
                    }
                    OpKind::Remove => {
                        if concurrent_ops(history, &active, OpKind::Insert, &op.key) > 0
                            || committed.contains(&op.key)
                        {
                            committed.remove(&op.key);
                            pending.entry(op.key.clone()).or_insert(0);
                        }
                    }
                    OpKind::Contains => {}
                }
                // A contains overlapping an uncertainty window can observe
                // either answer; release it from its obligation.
                for (thread, slot) in active.iter_mut().enumerate() {
                    if let Some(index) = *slot {
                        let open = &history.per_thread[thread][index];
                        if open.kind == OpKind::Contains && pending.contains_key(&open.key) {
                            cancelled[thread][index] = true;
                            *slot = None;
                        }
                    }
                }
            }
            EventKind::Exit => {
                if active[event.thread] == Some(event.index) {
                    active[event.thread] = None;
                }
                if cancelled[event.thread][event.index] {
                    continue;
                }
                match op.kind {
                    OpKind::Insert => {
                        if concurrent_ops(history, &active, OpKind::Remove, &op.key) > 0 {
                            pending.insert(op.key.clone(), event.time);
                        } else if window_still_open(&pending, op) {
                            // Leave the key undetermined.
                        } else {
                            pending.remove(&op.key);
                            committed.insert(op.key.clone());
                            last_commit.insert(op.key.clone(), op.clone());
                        }
                    }
                    OpKind::Remove => {
                        if concurrent_ops(history, &active, OpKind::Insert, &op.key) > 0 {
                            pending.insert(op.key.clone(), event.time);
                        } else if window_still_open(&pending, op) {
                            // Leave the key undetermined.
                        } else {
                            pending.remove(&op.key);
                            committed.remove(&op.key);
                            last_commit.insert(op.key.clone(), op.clone());
                        }
                    }
                    OpKind::Contains => {
                        if committed.contains(&op.key) != op.found {
                            return Err(HistoryViolation {
                                thread: event.thread,
                                entry: op.entry,
                                key: op.key.clone(),
                                observed: op.found,
                                last_commit: last_commit.get(&op.key).cloned(),
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Number of open operations of the given kind on the given key.
fn concurrent_ops<K: Eq>(
    history: &History<K>,
    active: &[Option<usize>],
    kind: OpKind,
    key: &K,
) -> usize {
    active
        .iter()
        .enumerate()
        .filter_map(|(thread, slot)| slot.map(|index| &history.per_thread[thread][index]))
        .filter(|op| op.kind == kind && op.key == *key)
        .count()
}

/// Whether an uncertainty window on the operation's key extends past its
/// entry, forcing the commit to stay deferred.
fn window_still_open<K: Eq + Hash>(pending: &HashMap<K, u64>, op: &Operation<K>) -> bool {
    pending.get(&op.key).is_some_and(|&upper| upper > op.entry)
}
