//! `CompactIdSet` — a word-packed atomic bitset over `[0, max_id]`.
//!
//! Used during construction to mark every id that appears anywhere in the
//! input, so that ids referenced only as neighbors can be materialized as
//! empty nodes afterwards. Insertion takes `&self` and is safe to call from
//! many threads at once; reads are expected after a join barrier.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::NodeId;

const WORD_BITS: usize = usize::BITS as usize;

/// A fixed-size, concurrently insertable set of node ids.
pub struct CompactIdSet {
    bits: usize,
    words: Vec<AtomicUsize>,
}

impl CompactIdSet {
    /// Creates an empty set able to hold every id in `[0, max_id]`.
    pub fn new(max_id: NodeId) -> Self {
        let bits = max_id as usize + 1;
        let words = (0..bits.div_ceil(WORD_BITS))
            .map(|_| AtomicUsize::new(0))
            .collect();
        Self { bits, words }
    }

    /// Adds `id`, returning `true` iff this call observed it absent.
    ///
    /// # Panics
    /// Panics if `id` is larger than the `max_id` the set was created with.
    #[inline]
    pub fn insert(&self, id: NodeId) -> bool {
        let bit = id as usize;
        assert!(bit < self.bits, "id {id} outside id set of {} bits", self.bits);
        let (word, mask) = word_mask(bit);
        // Ordering is supplied by the join barrier that ends the marking phase.
        let prev = self.words[word].fetch_or(mask, Ordering::Relaxed);
        prev & mask == 0
    }

    /// Returns `true` if `id` has been inserted. Ids beyond capacity are absent.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        let bit = id as usize;
        if bit >= self.bits {
            return false;
        }
        let (word, mask) = word_mask(bit);
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Returns `true` if no id has been inserted.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.load(Ordering::Relaxed) == 0)
    }

    /// Iterates the ids in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: self.words.iter().enumerate(),
            current: 0,
            base: 0,
        }
    }
}

impl core::fmt::Debug for CompactIdSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompactIdSet")
            .field("capacity", &self.bits)
            .field("len", &self.len())
            .finish()
    }
}

#[inline(always)]
fn word_mask(bit: usize) -> (usize, usize) {
    (bit / WORD_BITS, 1usize << (bit % WORD_BITS))
}

/// Ascending iterator over a [`CompactIdSet`].
pub struct Iter<'a> {
    words: core::iter::Enumerate<core::slice::Iter<'a, AtomicUsize>>,
    current: usize,
    base: usize,
}

impl Iterator for Iter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            if self.current != 0 {
                let trailing = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                // Every bit index is <= max_id, which came from a `NodeId`.
                #[allow(clippy::cast_possible_truncation)]
                return Some((self.base + trailing) as NodeId);
            }
            let (idx, word) = self.words.next()?;
            self.base = idx * WORD_BITS;
            self.current = word.load(Ordering::Relaxed);
        }
    }
}

impl<'a> IntoIterator for &'a CompactIdSet {
    type Item = NodeId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_contains_len() {
        let set = CompactIdSet::new(129);
        assert!(set.is_empty());

        assert!(set.insert(0));
        assert!(!set.insert(0));
        assert!(set.insert(129));
        assert!(set.insert(64));

        assert!(set.contains(0));
        assert!(set.contains(64));
        assert!(set.contains(129));
        assert!(!set.contains(1));
        assert!(!set.contains(500));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn iterates_in_ascending_order() {
        let set = CompactIdSet::new(200);
        for id in [128, 5, 64, 1, 200, 63] {
            set.insert(id);
        }
        let ids: Vec<_> = set.iter().collect();
        assert_eq!(ids, vec![1, 5, 63, 64, 128, 200]);
    }

    #[test]
    #[should_panic(expected = "outside id set")]
    fn insert_past_capacity_panics() {
        CompactIdSet::new(10).insert(11);
    }

    #[test]
    fn concurrent_inserts_from_scoped_threads() {
        let set = CompactIdSet::new(4095);
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let set = &set;
                s.spawn(move || {
                    for id in (t..4096).step_by(4) {
                        set.insert(id);
                    }
                });
            }
        });
        assert_eq!(set.len(), 4096);
        assert!(set.iter().eq(0..4096));
    }
}
