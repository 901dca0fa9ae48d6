//! The finished, read-only graph.

use crate::config::StoredGraphDir;
use crate::graph::node::Node;
use crate::graph::store::{NodeStore, StoreRepr};
use crate::NodeId;

/// An immutable directed graph produced by [`GraphBuilder`](crate::GraphBuilder).
///
/// Every id referenced anywhere in the input is present, either as an
/// explicitly listed node or as an empty placeholder. The graph offers no
/// mutation path and can be shared freely between threads.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `get_node_by_id` | \(O(1)\) | direct index (dense) or hash lookup (sparse) |
/// | `node_count` / `edge_count` / `max_node_id` | \(O(1)\) | computed at build time |
/// | `iter` | \(O(\text{max id})\) dense, \(O(n)\) sparse | unspecified order |
#[derive(Debug)]
pub struct DirectedGraph {
    stored_dir: StoredGraphDir,
    max_node_id: NodeId,
    node_count: usize,
    edge_count: u64,
    store: NodeStore<Node>,
}

impl DirectedGraph {
    pub(crate) fn new(
        stored_dir: StoredGraphDir,
        max_node_id: NodeId,
        edge_count: u64,
        store: NodeStore<Node>,
    ) -> Self {
        Self {
            stored_dir,
            max_node_id,
            node_count: store.len(),
            edge_count,
            store,
        }
    }

    /// Which direction(s) the graph stores.
    #[inline]
    pub fn stored_direction(&self) -> StoredGraphDir {
        self.stored_dir
    }

    /// Largest id referenced anywhere in the input (`0` for an empty graph).
    #[inline]
    pub fn max_node_id(&self) -> NodeId {
        self.max_node_id
    }

    /// Number of nodes, explicit and implicit.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of stored edges: supplied edges, counted twice when both
    /// directions are stored.
    #[inline]
    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    /// Returns `true` if the graph has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// The node store's backing layout.
    #[inline]
    pub fn storage_repr(&self) -> StoreRepr {
        self.store.repr()
    }

    /// Looks up a node. Ids outside `[0, max_node_id]` are simply absent.
    pub fn get_node_by_id(&self, id: i64) -> Option<&Node> {
        let id = NodeId::try_from(id).ok().filter(|&id| id <= self.max_node_id)?;
        self.store.get(id)
    }

    /// Returns `true` if `id` is a node of this graph.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id <= self.max_node_id && self.store.contains(id)
    }

    /// Iterates all nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.store.iter()
    }
}

impl<'a> IntoIterator for &'a DirectedGraph {
    type Item = &'a Node;
    type IntoIter = Box<dyn Iterator<Item = &'a Node> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeBuilder;

    fn tiny(repr: StoreRepr) -> DirectedGraph {
        let mut store = NodeStore::new(repr, 4, 2);
        store.insert(NodeBuilder::new(1, vec![4]).freeze(StoredGraphDir::OnlyOut)).unwrap();
        store.insert(NodeBuilder::placeholder(4).freeze(StoredGraphDir::OnlyOut)).unwrap();
        DirectedGraph::new(StoredGraphDir::OnlyOut, 4, 1, store)
    }

    #[test]
    fn lookups_outside_id_range_are_absent() {
        for repr in [StoreRepr::Dense, StoreRepr::Sparse] {
            let g = tiny(repr);
            assert!(g.get_node_by_id(-1).is_none());
            assert!(g.get_node_by_id(5).is_none());
            assert!(g.get_node_by_id(i64::MAX).is_none());
            assert!(g.get_node_by_id(2).is_none());
            assert_eq!(g.get_node_by_id(1).map(Node::outbound_neighbors), Some(&[4][..]));
            assert_eq!(g.node_count(), 2);
            assert_eq!(g.storage_repr(), repr);
        }
    }

    #[test]
    fn graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DirectedGraph>();

        let g = tiny(StoreRepr::Dense);
        let total: usize = std::thread::scope(|s| {
            let hs: Vec<_> = (0..3).map(|_| s.spawn(|| g.iter().count())).collect();
            hs.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(total, 6);
        assert_eq!((&g).into_iter().count(), 2);
    }
}
