//! Graph nodes and their two-phase lifecycle.
//!
//! A node is built as a [`NodeBuilder`]: its supplied edge array is fixed at
//! creation, and (for graphs storing both directions) an in-edge slot array
//! can be allocated at an exact size and then filled concurrently, one slot
//! per writer. [`NodeBuilder::freeze`] consumes the builder and yields a
//! read-only [`Node`]; there is no way back.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::StoredGraphDir;
use crate::NodeId;

/// Edge direction, as seen from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDir {
    /// Edges leaving the node.
    Out,
    /// Edges arriving at the node.
    In,
}

/// Anything the node store can index.
pub trait HasNodeId {
    /// The node's id.
    fn node_id(&self) -> NodeId;
}

/// Build-time form of a node.
pub struct NodeBuilder {
    id: NodeId,
    supplied: Box<[NodeId]>,
    in_slots: Option<Box<[AtomicU32]>>,
}

impl NodeBuilder {
    /// Creates a node from its supplied edges.
    pub fn new(id: NodeId, supplied: Vec<NodeId>) -> Self {
        Self {
            id,
            supplied: supplied.into_boxed_slice(),
            in_slots: None,
        }
    }

    /// Creates a node that was only referenced, never listed.
    pub fn placeholder(id: NodeId) -> Self {
        Self::new(id, Vec::new())
    }

    /// The node's id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The edge array read from input (out-edges unless only in-edges are stored).
    #[inline]
    pub fn supplied(&self) -> &[NodeId] {
        &self.supplied
    }

    /// Allocates an in-edge array of exactly `size` slots.
    ///
    /// # Panics
    /// Panics if in-edges were already allocated.
    pub fn allocate_in_edges(&mut self, size: usize) {
        assert!(self.in_slots.is_none(), "in-edges of node {} allocated twice", self.id);
        self.in_slots = Some((0..size).map(|_| AtomicU32::new(0)).collect());
    }

    /// Number of allocated in-edge slots.
    #[inline]
    pub fn in_capacity(&self) -> usize {
        self.in_slots.as_deref().map_or(0, <[AtomicU32]>::len)
    }

    /// Writes `source` into in-edge slot `slot`.
    ///
    /// Many threads may place into the same node at once as long as each
    /// uses a distinct slot.
    ///
    /// # Panics
    /// Panics if `slot` is outside the allocated in-edge array.
    #[inline]
    pub fn place_in_edge(&self, slot: usize, source: NodeId) {
        match self.in_slots.as_deref() {
            Some(slots) if slot < slots.len() => slots[slot].store(source, Ordering::Relaxed),
            _ => panic!(
                "in-edge slot {slot} out of bounds for node {} (capacity {})",
                self.id,
                self.in_capacity()
            ),
        }
    }

    /// Sorts the in-edge array ascending.
    pub fn sort_in_neighbors(&mut self) {
        if let Some(slots) = self.in_slots.as_deref_mut() {
            let mut values: Vec<NodeId> = slots.iter_mut().map(|s| *s.get_mut()).collect();
            values.sort_unstable();
            for (slot, v) in slots.iter_mut().zip(values) {
                *slot.get_mut() = v;
            }
        }
    }

    /// Freezes the node for a graph storing `dir`.
    pub fn freeze(self, dir: StoredGraphDir) -> Node {
        let (out_edges, in_edges) = match dir {
            StoredGraphDir::OnlyOut => (Some(self.supplied), None),
            StoredGraphDir::OnlyIn => (None, Some(self.supplied)),
            StoredGraphDir::BothInOut => {
                let derived = self
                    .in_slots
                    .map(|slots| slots.into_vec().into_iter().map(AtomicU32::into_inner).collect())
                    .unwrap_or_default();
                (Some(self.supplied), Some(derived))
            }
        };
        Node {
            id: self.id,
            out_edges,
            in_edges,
        }
    }
}

impl HasNodeId for NodeBuilder {
    #[inline]
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl core::fmt::Debug for NodeBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeBuilder")
            .field("id", &self.id)
            .field("supplied", &self.supplied)
            .field("in_capacity", &self.in_capacity())
            .finish()
    }
}

/// A frozen, read-only node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    out_edges: Option<Box<[NodeId]>>,
    in_edges: Option<Box<[NodeId]>>,
}

impl Node {
    /// The node's id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Neighbors in `dir`, or `None` if the graph does not store that direction.
    #[inline]
    pub fn neighbors(&self, dir: EdgeDir) -> Option<&[NodeId]> {
        match dir {
            EdgeDir::Out => self.out_edges.as_deref(),
            EdgeDir::In => self.in_edges.as_deref(),
        }
    }

    /// Out-neighbors; empty if out-edges are not stored.
    #[inline]
    pub fn outbound_neighbors(&self) -> &[NodeId] {
        self.neighbors(EdgeDir::Out).unwrap_or_default()
    }

    /// In-neighbors; empty if in-edges are not stored.
    #[inline]
    pub fn inbound_neighbors(&self) -> &[NodeId] {
        self.neighbors(EdgeDir::In).unwrap_or_default()
    }

    /// Number of out-neighbors.
    #[inline]
    pub fn out_degree(&self) -> usize {
        self.outbound_neighbors().len()
    }

    /// Number of in-neighbors.
    #[inline]
    pub fn in_degree(&self) -> usize {
        self.inbound_neighbors().len()
    }
}

impl HasNodeId for Node {
    #[inline]
    fn node_id(&self) -> NodeId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_maps_supplied_side_by_direction() {
        let out = NodeBuilder::new(1, vec![2, 3]).freeze(StoredGraphDir::OnlyOut);
        assert_eq!(out.neighbors(EdgeDir::Out), Some(&[2, 3][..]));
        assert_eq!(out.neighbors(EdgeDir::In), None);

        let inn = NodeBuilder::new(1, vec![2, 3]).freeze(StoredGraphDir::OnlyIn);
        assert_eq!(inn.neighbors(EdgeDir::Out), None);
        assert_eq!(inn.inbound_neighbors(), &[2, 3]);
        assert!(inn.outbound_neighbors().is_empty());
    }

    #[test]
    fn allocate_place_sort_freeze() {
        let mut b = NodeBuilder::new(5, vec![1]);
        b.allocate_in_edges(3);
        assert_eq!(b.in_capacity(), 3);
        b.place_in_edge(0, 9);
        b.place_in_edge(2, 4);
        b.place_in_edge(1, 7);
        b.sort_in_neighbors();

        let n = b.freeze(StoredGraphDir::BothInOut);
        assert_eq!(n.inbound_neighbors(), &[4, 7, 9]);
        assert_eq!(n.outbound_neighbors(), &[1]);
        assert_eq!(n.in_degree(), 3);
    }

    #[test]
    fn unallocated_in_edges_freeze_empty() {
        let n = NodeBuilder::placeholder(3).freeze(StoredGraphDir::BothInOut);
        assert_eq!(n.neighbors(EdgeDir::In), Some(&[][..]));
        assert_eq!(n.neighbors(EdgeDir::Out), Some(&[][..]));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn placing_past_capacity_panics() {
        let mut b = NodeBuilder::placeholder(0);
        b.allocate_in_edges(1);
        b.place_in_edge(1, 3);
    }

    #[test]
    fn concurrent_placement_fills_every_slot() {
        let mut b = NodeBuilder::placeholder(0);
        b.allocate_in_edges(64);
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let b = &b;
                s.spawn(move || {
                    for i in 0..16u32 {
                        let slot = (t * 16 + i) as usize;
                        b.place_in_edge(slot, t * 100 + i);
                    }
                });
            }
        });
        b.sort_in_neighbors();
        let n = b.freeze(StoredGraphDir::BothInOut);
        assert_eq!(n.in_degree(), 64);
        assert!(n.inbound_neighbors().windows(2).all(|w| w[0] <= w[1]));
    }
}
