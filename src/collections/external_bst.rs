//! A concurrent external binary search tree under hand-over-hand locking.
//!
//! All keys live in leaves. Interior nodes are routing nodes: each
//! carries the maximum key of its left subtree and no element of the set.
//! A sentinel root always exists; the live tree hangs off its right side,
//! and the sentinel owns the monotone operation clock.
//!
//! # Invariants
//!
//! - A routing node has two children; a leaf has none.
//! - For a routing node with key `k`, every leaf under its left child has
//!   key `<= k` and every leaf under its right child has key `> k`; leaf
//!   keys are unique.
//! - Descent holds at most two adjacent locks, releasing the grandparent
//!   only after acquiring the grandchild; removal briefly holds the
//!   target leaf as a third at the unlink point. Locks are only ever
//!   taken parent before child, so the acquisition order is acyclic and
//!   the protocol deadlock-free.
//! - The clock is read and bumped under the sentinel lock at the start of
//!   every operation, so entry timestamps are totally ordered and each
//!   operation observes a distinct value.
//!
//! An unlinked node may still be locked by a concurrent descender; nodes
//! are shared through [`Arc`], so unlinking merely drops the tree's
//! references and the node is freed once the last holder lets go.

use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

type NodeRef<K> = Arc<Mutex<Node<K>>>;
type NodeGuard<K> = ArcMutexGuard<RawMutex, Node<K>>;
type RootGuard<K> = ArcMutexGuard<RawMutex, SentinelRoot<K>>;

struct Node<K> {
    key: K,
    routing: bool,
    left: Option<NodeRef<K>>,
    right: Option<NodeRef<K>>,
}

/// The sentinel: parent of the whole tree and owner of the clock.
struct SentinelRoot<K> {
    clock: u64,
    right: Option<NodeRef<K>>,
}

/// The lock window trailing a descent: the parent of the current node.
enum Parent<K> {
    Root(RootGuard<K>),
    Node(NodeGuard<K>),
}

impl<K> Parent<K> {
    /// Swings the child pointer that referenced `old` to `new`.
    fn replace_child(&mut self, old: &NodeRef<K>, new: Option<NodeRef<K>>) {
        match self {
            Parent::Root(guard) => guard.right = new,
            Parent::Node(guard) => {
                if guard.left.as_ref().is_some_and(|l| Arc::ptr_eq(l, old)) {
                    guard.left = new;
                } else {
                    guard.right = new;
                }
            }
        }
    }
}

/// A linearizable concurrent set of keys with timestamped operations.
pub struct ExternalBst<K> {
    root: Arc<Mutex<SentinelRoot<K>>>,
}

impl<K: Ord + Clone> ExternalBst<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            root: Arc::new(Mutex::new(SentinelRoot { clock: 0, right: None })),
        }
    }

    /// Inserts `key`; a no-op if it is already present.
    pub fn insert(&self, key: K) {
        self.insert_timed(key);
    }

    /// Inserts `key` and returns the operation's entry timestamp.
    pub fn insert_timed(&self, key: K) -> u64 {
        let mut root = self.root.lock_arc();
        let entry = tick(&mut root);

        let Some(first) = root.right.clone() else {
            root.right = Some(new_leaf(key));
            return entry;
        };

        let mut cur_ref = first;
        let mut cur = cur_ref.lock_arc();
        let mut parent = Parent::Root(root);
        while cur.routing {
            let side = if key <= cur.key { &cur.left } else { &cur.right };
            let next_ref = side.clone().expect("routing node must have two children");
            let next = next_ref.lock_arc();
            parent = Parent::Node(cur);
            cur_ref = next_ref;
            cur = next;
        }

        if cur.key == key {
            return entry;
        }

        // Split the leaf: the smaller key becomes the left child and also
        // the separator, keeping left <= separator < right.
        let key_is_smaller = key < cur.key;
        let separator = if key_is_smaller { key.clone() } else { cur.key.clone() };
        let fresh = new_leaf(key);
        let (left, right) = if key_is_smaller {
            (fresh, Arc::clone(&cur_ref))
        } else {
            (Arc::clone(&cur_ref), fresh)
        };
        let routing = Arc::new(Mutex::new(Node {
            key: separator,
            routing: true,
            left: Some(left),
            right: Some(right),
        }));
        parent.replace_child(&cur_ref, Some(routing));
        entry
    }

    /// Removes `key`; a no-op if it is absent.
    pub fn remove(&self, key: &K) {
        self.remove_timed(key);
    }

    /// Removes `key` and returns the operation's entry timestamp.
    pub fn remove_timed(&self, key: &K) -> u64 {
        let mut root = self.root.lock_arc();
        let entry = tick(&mut root);

        let Some(first) = root.right.clone() else {
            return entry;
        };
        let first_guard = first.lock_arc();

        if !first_guard.routing {
            if first_guard.key == *key {
                drop(first_guard);
                root.right = None;
            }
            return entry;
        }

        let mut parent = Parent::Root(root);
        let mut cur_ref = first;
        let mut cur = first_guard;
        loop {
            let side = if *key <= cur.key { &cur.left } else { &cur.right };
            let next_ref = side.clone().expect("routing node must have two children");
            let next = next_ref.lock_arc();
            if next.routing {
                parent = Parent::Node(cur);
                cur_ref = next_ref;
                cur = next;
                continue;
            }

            // `next` is the only leaf the key can occupy. Unlink the leaf
            // and its routing parent by swinging the grandparent to the
            // sibling subtree.
            if next.key == *key {
                let sibling = if *key <= cur.key { cur.right.clone() } else { cur.left.clone() };
                drop(next);
                parent.replace_child(&cur_ref, sibling);
            }
            return entry;
        }
    }

    /// Whether `key` is in the set.
    pub fn contains(&self, key: &K) -> bool {
        self.contains_timed(key).0
    }

    /// Membership of `key` plus the operation's entry timestamp.
    pub fn contains_timed(&self, key: &K) -> (bool, u64) {
        let mut root = self.root.lock_arc();
        let entry = tick(&mut root);

        let Some(first) = root.right.clone() else {
            return (false, entry);
        };

        let mut cur = first.lock_arc();
        let mut parent = Parent::Root(root);
        while cur.routing {
            let side = if *key <= cur.key { &cur.left } else { &cur.right };
            let next_ref = side.clone().expect("routing node must have two children");
            let next = next_ref.lock_arc();
            parent = Parent::Node(cur);
            cur = next;
        }
        let found = cur.key == *key;
        // Still holding parent and leaf, per the locking protocol.
        drop(parent);
        drop(cur);
        (found, entry)
    }

    /// Checks the external-BST predicate on a quiescent tree: child shape
    /// rules, key bounds, and leaf uniqueness.
    ///
    /// Concurrent mutators may still be descending; the walk takes each
    /// node's lock, so it is meant for use after writers have joined.
    pub fn is_valid(&self) -> bool {
        let root = self.root.lock();
        match &root.right {
            None => true,
            Some(node) => valid_subtree(node, None, None),
        }
    }

    /// The inorder walk of the leaves, i.e. the set in ascending order.
    pub fn leaf_keys(&self) -> Vec<K> {
        let root = self.root.lock();
        let mut keys = Vec::new();
        if let Some(node) = &root.right {
            collect_leaves(node, &mut keys);
        }
        keys
    }
}

impl<K: Ord + Clone> Default for ExternalBst<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn tick<K>(root: &mut SentinelRoot<K>) -> u64 {
    let entry = root.clock;
    root.clock += 1;
    entry
}

fn new_leaf<K>(key: K) -> NodeRef<K> {
    Arc::new(Mutex::new(Node {
        key,
        routing: false,
        left: None,
        right: None,
    }))
}

/// Leaf keys in the subtree must lie in `(lower, upper]`; `None` bounds
/// are unbounded.
fn valid_subtree<K: Ord>(node: &NodeRef<K>, lower: Option<&K>, upper: Option<&K>) -> bool {
    let guard = node.lock();
    if !guard.routing {
        return guard.left.is_none()
            && guard.right.is_none()
            && lower.map_or(true, |lo| guard.key > *lo)
            && upper.map_or(true, |hi| guard.key <= *hi);
    }
    let (Some(left), Some(right)) = (&guard.left, &guard.right) else {
        return false;
    };
    valid_subtree(left, lower, Some(&guard.key)) && valid_subtree(right, Some(&guard.key), upper)
}

fn collect_leaves<K: Clone>(node: &NodeRef<K>, keys: &mut Vec<K>) {
    let guard = node.lock();
    if guard.routing {
        if let Some(left) = &guard.left {
            collect_leaves(left, keys);
        }
        if let Some(right) = &guard.right {
            collect_leaves(right, keys);
        }
    } else {
        keys.push(guard.key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::thread;

    use rand::Rng;

    #[test]
    fn insert_contains_remove_round() {
        let set = ExternalBst::new();
        set.insert(5);
        set.insert(3);
        set.insert(7);
        assert!(set.contains(&3));
        set.remove(&3);
        assert!(!set.contains(&3));
        assert_eq!(set.leaf_keys(), vec![5, 7]);
        assert!(set.is_valid());
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let set = ExternalBst::new();
        set.insert(42);
        set.insert(42);
        assert_eq!(set.leaf_keys(), vec![42]);
        assert!(set.is_valid());
    }

    #[test]
    fn remove_on_empty_and_absent() {
        let set: ExternalBst<i32> = ExternalBst::new();
        set.remove(&1);
        set.insert(10);
        set.remove(&11);
        assert_eq!(set.leaf_keys(), vec![10]);
        assert!(set.is_valid());
    }

    #[test]
    fn remove_the_only_leaf() {
        let set = ExternalBst::new();
        set.insert(9);
        set.remove(&9);
        assert!(set.leaf_keys().is_empty());
        assert!(!set.contains(&9));
        assert!(set.is_valid());
    }

    #[test]
    fn remove_leaf_whose_sibling_is_routing() {
        // Build {1, 2, 3}: removing 1 must swing the grandparent to the
        // routing sibling, not just drop the leaf.
        let set = ExternalBst::new();
        set.insert(2);
        set.insert(1);
        set.insert(3);
        set.remove(&1);
        assert_eq!(set.leaf_keys(), vec![2, 3]);
        assert!(set.is_valid());

        set.insert(1);
        set.remove(&3);
        assert_eq!(set.leaf_keys(), vec![1, 2]);
        assert!(set.is_valid());
    }

    #[test]
    fn matches_btreeset_oracle_sequentially() {
        let set = ExternalBst::new();
        let mut oracle = BTreeSet::new();
        let mut rng = rand::thread_rng();

        for _ in 0..5_000 {
            let key: u16 = rng.gen_range(0..200);
            match rng.gen_range(0..3) {
                0 => {
                    set.insert(key);
                    oracle.insert(key);
                }
                1 => {
                    set.remove(&key);
                    oracle.remove(&key);
                }
                _ => assert_eq!(set.contains(&key), oracle.contains(&key)),
            }
        }

        assert!(set.is_valid());
        assert_eq!(set.leaf_keys(), oracle.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn leaf_keys_are_sorted_and_unique() {
        let set = ExternalBst::new();
        for key in [5, 1, 9, 3, 7, 1, 9, 2] {
            set.insert(key);
        }
        let keys = set.leaf_keys();
        assert_eq!(keys, vec![1, 2, 3, 5, 7, 9]);
    }

    #[test]
    fn timestamps_are_strictly_increasing() {
        let set = ExternalBst::new();
        let mut last = set.insert_timed(1);
        for key in 2..100 {
            let t = if key % 2 == 0 {
                set.insert_timed(key)
            } else {
                set.contains_timed(&key).1
            };
            assert!(t > last);
            last = t;
        }
        let t = set.remove_timed(&1);
        assert!(t > last);
    }

    #[test]
    fn concurrent_mix_keeps_the_predicate() {
        let set = ExternalBst::new();
        for key in (0..1000).step_by(2) {
            set.insert(key);
        }

        thread::scope(|s| {
            for t in 0..4 {
                let set = &set;
                s.spawn(move || {
                    let mut rng = rand::thread_rng();
                    for _ in 0..2_000 {
                        let key: i32 = rng.gen_range(0..1000);
                        match (t + key) % 3 {
                            0 => set.insert(key),
                            1 => set.remove(&key),
                            _ => {
                                set.contains(&key);
                            }
                        }
                    }
                });
            }
        });

        assert!(set.is_valid());
        let keys = set.leaf_keys();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn concurrent_timestamps_are_globally_distinct() {
        let set = ExternalBst::new();
        let stamps: Vec<u64> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let set = &set;
                    s.spawn(move || {
                        let mut local = Vec::new();
                        for i in 0..500 {
                            local.push(set.insert_timed(t * 1000 + i));
                        }
                        // Per-thread observations must already be ordered.
                        assert!(local.windows(2).all(|w| w[0] < w[1]));
                        local
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let mut sorted = stamps.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), stamps.len());
    }
}
