//! Id-indexed node storage.
//!
//! A [`NodeStore`] maps ids to nodes. It is backed either by a dense
//! `Vec<Option<N>>` indexed by id (O(max id) space, direct access) or by a
//! sparse hash map (O(node count) space). The representation is chosen once,
//! when the store is created, and never changes.
//!
//! ### Representation choice
//! | `force_sparse` | Result |
//! |----------------|--------|
//! | `Some(true)`   | sparse |
//! | `Some(false)`  | dense  |
//! | `None`         | sparse iff `nodes * 8 < max_id` and `edges < 4 * max_id` |

use rayon::iter::Either;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::{BuildError, Result};
use crate::graph::node::HasNodeId;
use crate::NodeId;

const SPARSE_NODE_RATIO: u64 = 8;
const SPARSE_EDGE_RATIO: u64 = 4;

/// Backing representation of a [`NodeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRepr {
    /// Array indexed directly by id.
    Dense,
    /// Hash map keyed by id.
    Sparse,
}

impl StoreRepr {
    /// Picks a representation from an explicit override or the density heuristic.
    pub fn choose(force_sparse: Option<bool>, num_nodes: u64, max_id: NodeId, num_edges: u64) -> Self {
        let sparse = force_sparse.unwrap_or_else(|| {
            let max_id = u64::from(max_id);
            num_nodes.saturating_mul(SPARSE_NODE_RATIO) < max_id
                && num_edges < max_id.saturating_mul(SPARSE_EDGE_RATIO)
        });
        let repr = if sparse { Self::Sparse } else { Self::Dense };
        tracing::trace!(?repr, ?force_sparse, num_nodes, max_id, num_edges, "chose node store layout");
        repr
    }
}

enum Repr<N> {
    Dense { slots: Vec<Option<N>>, len: usize },
    Sparse(FxHashMap<NodeId, N>),
}

/// Id-indexed node container.
pub struct NodeStore<N> {
    repr: Repr<N>,
}

impl<N: HasNodeId> NodeStore<N> {
    /// Creates an empty store for ids in `[0, max_id]`.
    ///
    /// `expected_nodes` is only a capacity hint for the sparse layout.
    pub fn new(repr: StoreRepr, max_id: NodeId, expected_nodes: usize) -> Self {
        let repr = match repr {
            StoreRepr::Dense => {
                let mut slots = Vec::new();
                slots.resize_with(max_id as usize + 1, || None);
                Repr::Dense { slots, len: 0 }
            }
            StoreRepr::Sparse => {
                Repr::Sparse(FxHashMap::with_capacity_and_hasher(expected_nodes, Default::default()))
            }
        };
        Self { repr }
    }

    /// Adds `node`.
    ///
    /// # Errors
    /// [`BuildError::DuplicateNode`] if a node with the same id is already stored.
    ///
    /// # Panics
    /// Panics if a dense store is given an id larger than its `max_id`.
    pub fn insert(&mut self, node: N) -> Result<()> {
        let id = node.node_id();
        match &mut self.repr {
            Repr::Dense { slots, len } => {
                let slot = &mut slots[id as usize];
                if slot.is_some() {
                    return Err(BuildError::DuplicateNode { id });
                }
                *slot = Some(node);
                *len += 1;
            }
            Repr::Sparse(map) => match map.entry(id) {
                std::collections::hash_map::Entry::Occupied(_) => {
                    return Err(BuildError::DuplicateNode { id });
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(node);
                }
            },
        }
        Ok(())
    }
}

impl<N> NodeStore<N> {
    /// The backing representation.
    pub fn repr(&self) -> StoreRepr {
        match self.repr {
            Repr::Dense { .. } => StoreRepr::Dense,
            Repr::Sparse(_) => StoreRepr::Sparse,
        }
    }

    /// Returns the node with `id`, if stored.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&N> {
        match &self.repr {
            Repr::Dense { slots, .. } => slots.get(id as usize).and_then(Option::as_ref),
            Repr::Sparse(map) => map.get(&id),
        }
    }

    /// Returns `true` if a node with `id` is stored.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Dense { len, .. } => *len,
            Repr::Sparse(map) => map.len(),
        }
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates all nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &N> + '_ {
        match &self.repr {
            Repr::Dense { slots, .. } => Either::Left(slots.iter().filter_map(Option::as_ref)),
            Repr::Sparse(map) => Either::Right(map.values()),
        }
    }
}

impl<N: Send + Sync> NodeStore<N> {
    /// Parallel iteration over all nodes.
    pub fn par_iter(&self) -> impl ParallelIterator<Item = &N> + '_ {
        match &self.repr {
            Repr::Dense { slots, .. } => Either::Left(slots.par_iter().filter_map(Option::as_ref)),
            Repr::Sparse(map) => Either::Right(map.par_iter().map(|(_, n)| n)),
        }
    }

    /// Parallel mutable iteration over all nodes. The key set cannot change.
    pub fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = &mut N> + '_ {
        match &mut self.repr {
            Repr::Dense { slots, .. } => Either::Left(slots.par_iter_mut().filter_map(Option::as_mut)),
            Repr::Sparse(map) => Either::Right(map.par_iter_mut().map(|(_, n)| n)),
        }
    }

    /// Converts every node with `f`, in parallel, keeping ids and layout.
    pub fn freeze_with<M, F>(self, f: F) -> NodeStore<M>
    where
        M: Send,
        F: Fn(N) -> M + Sync + Send,
    {
        let repr = match self.repr {
            Repr::Dense { slots, len } => Repr::Dense {
                slots: slots.into_par_iter().map(|slot| slot.map(&f)).collect(),
                len,
            },
            Repr::Sparse(map) => {
                Repr::Sparse(map.into_par_iter().map(|(id, n)| (id, f(n))).collect())
            }
        };
        NodeStore { repr }
    }
}

impl<N> core::fmt::Debug for NodeStore<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeStore")
            .field("repr", &self.repr())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(NodeId);

    impl HasNodeId for Item {
        fn node_id(&self) -> NodeId {
            self.0
        }
    }

    #[test]
    fn heuristic_prefers_sparse_for_few_nodes_in_large_id_space() {
        assert_eq!(StoreRepr::choose(None, 10, 1_000, 100), StoreRepr::Sparse);
        // Too many nodes for the id space.
        assert_eq!(StoreRepr::choose(None, 200, 1_000, 100), StoreRepr::Dense);
        // Edge volume dominates.
        assert_eq!(StoreRepr::choose(None, 10, 1_000, 4_000), StoreRepr::Dense);
        assert_eq!(StoreRepr::choose(Some(true), 200, 1_000, 100), StoreRepr::Sparse);
        assert_eq!(StoreRepr::choose(Some(false), 10, 1_000, 100), StoreRepr::Dense);
        assert_eq!(StoreRepr::choose(None, 0, 0, 0), StoreRepr::Dense);
    }

    #[test]
    fn duplicate_ids_are_rejected_in_both_layouts() {
        for repr in [StoreRepr::Dense, StoreRepr::Sparse] {
            let mut s = NodeStore::new(repr, 10, 4);
            s.insert(Item(3)).unwrap();
            s.insert(Item(10)).unwrap();
            assert!(matches!(s.insert(Item(3)), Err(BuildError::DuplicateNode { id: 3 })));
            assert_eq!(s.len(), 2);
            assert_eq!(s.repr(), repr);
        }
    }

    #[test]
    fn lookup_and_iteration() {
        for repr in [StoreRepr::Dense, StoreRepr::Sparse] {
            let mut s = NodeStore::new(repr, 100, 3);
            for id in [7, 0, 42] {
                s.insert(Item(id)).unwrap();
            }
            assert_eq!(s.get(42), Some(&Item(42)));
            assert!(s.get(41).is_none());
            assert!(s.get(5_000).is_none());
            assert!(s.contains(0));

            let mut ids: Vec<_> = s.iter().map(|n| n.0).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![0, 7, 42]);
            assert_eq!(s.par_iter().count(), 3);
        }
    }

    #[test]
    fn freeze_with_converts_every_node() {
        for repr in [StoreRepr::Dense, StoreRepr::Sparse] {
            let mut s = NodeStore::new(repr, 20, 2);
            s.insert(Item(1)).unwrap();
            s.insert(Item(20)).unwrap();
            assert_eq!(s.par_iter_mut().count(), 2);

            let frozen = s.freeze_with(|n| Item(n.0));
            assert_eq!(frozen.len(), 2);
            assert_eq!(frozen.repr(), repr);
            assert_eq!(frozen.get(20), Some(&Item(20)));
        }
    }
}
