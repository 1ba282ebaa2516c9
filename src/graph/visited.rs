//! Shared visited flags for concurrent graph traversals.

use core::sync::atomic::{AtomicBool, Ordering};

/// A per-vertex visited flag vector claimed with compare-and-set.
///
/// The successful CAS in [`AtomicVisited::try_visit`] is the
/// linearization point for the first discovery of a vertex.
pub(crate) struct AtomicVisited {
    flags: Vec<AtomicBool>,
}

impl AtomicVisited {
    pub(crate) fn new(len: usize) -> Self {
        let flags = (0..len).map(|_| AtomicBool::new(false)).collect();
        Self { flags }
    }

    /// Marks a vertex visited without contending for it.
    #[inline]
    pub(crate) fn mark(&self, idx: usize) {
        self.flags[idx].store(true, Ordering::Relaxed);
    }

    /// Returns `true` iff this call observed the vertex as not yet
    /// visited and claimed it.
    #[inline]
    pub(crate) fn try_visit(&self, idx: usize, order: Ordering) -> bool {
        self.flags[idx]
            .compare_exchange(false, true, order, Ordering::Relaxed)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn is_visited(&self, idx: usize) -> bool {
        self.flags[idx].load(Ordering::Relaxed)
    }
}
