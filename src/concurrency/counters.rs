//! Per-id atomic counters for in-edge reconstruction.
//!
//! One counter exists for every known id. The counters are used twice:
//! first to count in-degrees, then, after being drained to zero, as write
//! cursors handing out unique slot indices. Between the two uses there must
//! be a join barrier; the counters themselves only use relaxed atomics.

use core::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::FxHashMap;

use crate::graph::StoreRepr;
use crate::NodeId;

enum Slots {
    Dense(Vec<AtomicUsize>),
    Sparse(FxHashMap<NodeId, AtomicUsize>),
}

/// One zero-initialized atomic counter per known id.
pub struct DegreeCounters {
    slots: Slots,
}

impl DegreeCounters {
    /// Counters for every id in `[0, max_id]`, indexed directly.
    pub fn dense(max_id: NodeId) -> Self {
        let len = max_id as usize + 1;
        let slots = (0..len).map(|_| AtomicUsize::new(0)).collect();
        Self {
            slots: Slots::Dense(slots),
        }
    }

    /// Counters for exactly the given ids, kept in a hash map.
    pub fn sparse(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let slots = ids.into_iter().map(|id| (id, AtomicUsize::new(0))).collect();
        Self {
            slots: Slots::Sparse(slots),
        }
    }

    /// Counters laid out like a store of the given representation.
    pub fn for_repr(repr: StoreRepr, max_id: NodeId, ids: impl IntoIterator<Item = NodeId>) -> Self {
        match repr {
            StoreRepr::Dense => Self::dense(max_id),
            StoreRepr::Sparse => Self::sparse(ids),
        }
    }

    #[inline]
    fn slot(&self, id: NodeId) -> &AtomicUsize {
        match &self.slots {
            Slots::Dense(v) => &v[id as usize],
            Slots::Sparse(m) => m
                .get(&id)
                .unwrap_or_else(|| panic!("no counter for unknown id {id}")),
        }
    }

    /// Adds one to `id`'s counter.
    ///
    /// # Panics
    /// Panics if `id` has no counter.
    #[inline]
    pub fn increment(&self, id: NodeId) {
        self.slot(id).fetch_add(1, Ordering::Relaxed);
    }

    /// Reads `id`'s counter.
    #[inline]
    pub fn load(&self, id: NodeId) -> usize {
        self.slot(id).load(Ordering::Relaxed)
    }

    /// Returns `id`'s counter and resets it to zero.
    #[inline]
    pub fn take(&self, id: NodeId) -> usize {
        self.slot(id).swap(0, Ordering::Relaxed)
    }

    /// Returns `id`'s counter and advances it by one. Concurrent callers for
    /// the same id always receive distinct values.
    #[inline]
    pub fn claim(&self, id: NodeId) -> usize {
        self.slot(id).fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_then_cursor() {
        let c = DegreeCounters::dense(3);
        c.increment(2);
        c.increment(2);
        c.increment(0);
        assert_eq!(c.load(2), 2);
        assert_eq!(c.take(2), 2);
        assert_eq!(c.load(2), 0);
        assert_eq!(c.claim(2), 0);
        assert_eq!(c.claim(2), 1);
        assert_eq!(c.load(0), 1);
        assert_eq!(c.load(3), 0);
    }

    #[test]
    fn sparse_counters_cover_only_known_ids() {
        let c = DegreeCounters::sparse([10, 1_000_000]);
        c.increment(1_000_000);
        assert_eq!(c.take(1_000_000), 1);
        assert_eq!(c.load(10), 0);
    }

    #[test]
    #[should_panic(expected = "unknown id")]
    fn sparse_unknown_id_panics() {
        DegreeCounters::sparse([1]).increment(2);
    }

    #[test]
    fn concurrent_claims_are_unique() {
        let c = DegreeCounters::dense(0);
        let mut claimed: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| c.claim(0)).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        claimed.sort_unstable();
        assert_eq!(claimed, (0..1000).collect::<Vec<_>>());
    }
}
