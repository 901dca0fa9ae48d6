//! In-edge reconstruction for graphs that store both directions.
//!
//! Four phases, each ending in an executor join barrier:
//!
//! 1. **sizing**: every out-edge `u -> v` increments `counter[v]`, so each
//!    counter ends up holding the exact in-degree of its id;
//! 2. **allocation**: each node drains its counter back to zero and, if the
//!    count was non-zero, allocates an in-edge array of exactly that size;
//! 3. **placement**: every out-edge `u -> v` claims `counter[v]` with a
//!    fetch-and-increment and writes `u` into the claimed slot of `v`;
//! 4. **sort** (optional): each in-edge array is sorted.
//!
//! Sizing and placement walk the same partitions, so the claims for `v`
//! are exactly `0..in_degree(v)` and no two writers share a slot. Allocation
//! must observe final counts, which is why the phases stay separate.

use rayon::prelude::*;

use crate::concurrency::{BoundedExecutor, DegreeCounters};
use crate::config::NeighborsSortingStrategy;
use crate::error::Result;
use crate::graph::{NodeBuilder, NodeStore};
use crate::metrics::{timed, BuildMetrics};
use crate::NodeId;

#[inline]
fn stored(store: &NodeStore<NodeBuilder>, id: NodeId) -> &NodeBuilder {
    store
        .get(id)
        .unwrap_or_else(|| panic!("node {id} referenced but missing from store"))
}

/// Derives every node's in-edges from the supplied out-edges.
pub(crate) fn reconstruct(
    exec: &BoundedExecutor,
    metrics: &dyn BuildMetrics,
    store: &mut NodeStore<NodeBuilder>,
    partitions: &[Vec<NodeId>],
    max_id: NodeId,
    sorting: NeighborsSortingStrategy,
) -> Result<()> {
    let counters = DegreeCounters::for_repr(store.repr(), max_id, store.iter().map(NodeBuilder::id));

    timed(metrics, "find-in-edge-sizes", || {
        let store = &*store;
        exec.for_each("find-in-edge-sizes", partitions, |ids| {
            for &u in ids {
                for &v in stored(store, u).supplied() {
                    counters.increment(v);
                }
            }
        })
    })?;

    timed(metrics, "instantiate-in-edges", || {
        exec.install("instantiate-in-edges", || {
            store.par_iter_mut().for_each(|node| {
                let in_degree = counters.take(node.id());
                if in_degree > 0 {
                    node.allocate_in_edges(in_degree);
                }
            });
        })
    })?;

    timed(metrics, "populate-in-edges", || {
        let store = &*store;
        exec.for_each("populate-in-edges", partitions, |ids| {
            for &u in ids {
                for &v in stored(store, u).supplied() {
                    let slot = counters.claim(v);
                    stored(store, v).place_in_edge(slot, u);
                }
            }
        })
    })?;

    debug_assert!(
        store.iter().all(|n| counters.load(n.id()) == n.in_capacity()),
        "in-edge placement did not fill every allocated slot"
    );

    if sorting.sorts_derived() {
        timed(metrics, "sort-in-edges", || {
            exec.install("sort-in-edges", || {
                store.par_iter_mut().for_each(NodeBuilder::sort_in_neighbors);
            })
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoredGraphDir;
    use crate::graph::StoreRepr;
    use crate::metrics::RecordingMetrics;

    fn store_with(repr: StoreRepr, nodes: Vec<NodeBuilder>, max_id: NodeId) -> NodeStore<NodeBuilder> {
        let mut store = NodeStore::new(repr, max_id, nodes.len());
        for n in nodes {
            store.insert(n).unwrap();
        }
        store
    }

    #[test]
    fn in_edges_match_in_degrees() {
        for repr in [StoreRepr::Dense, StoreRepr::Sparse] {
            let exec = BoundedExecutor::new(3).unwrap();
            let metrics = RecordingMetrics::new();
            // 0 -> 2, 0 -> 3, 1 -> 3, 2 -> 3, 3 -> 0 ; 4 is unreferenced
            let mut store = store_with(
                repr,
                vec![
                    NodeBuilder::new(0, vec![2, 3]),
                    NodeBuilder::new(1, vec![3]),
                    NodeBuilder::new(2, vec![3]),
                    NodeBuilder::new(3, vec![0]),
                    NodeBuilder::placeholder(4),
                ],
                4,
            );
            let partitions = vec![vec![0, 1], vec![2], vec![3]];

            reconstruct(
                &exec,
                &metrics,
                &mut store,
                &partitions,
                4,
                NeighborsSortingStrategy::SortWhileReading,
            )
            .unwrap();

            assert_eq!(store.get(3).unwrap().in_capacity(), 3);
            assert_eq!(store.get(4).unwrap().in_capacity(), 0);

            let frozen = store.freeze_with(|n| n.freeze(StoredGraphDir::BothInOut));
            assert_eq!(frozen.get(3).unwrap().inbound_neighbors(), &[0, 1, 2]);
            assert_eq!(frozen.get(2).unwrap().inbound_neighbors(), &[0]);
            assert_eq!(frozen.get(0).unwrap().inbound_neighbors(), &[3]);
            assert!(frozen.get(1).unwrap().inbound_neighbors().is_empty());
            assert!(frozen.get(4).unwrap().inbound_neighbors().is_empty());

            assert_eq!(
                metrics.phase_names(),
                vec!["find-in-edge-sizes", "instantiate-in-edges", "populate-in-edges", "sort-in-edges"]
            );
        }
    }

    #[test]
    fn repeated_edges_fill_repeated_slots() {
        let exec = BoundedExecutor::new(2).unwrap();
        let mut store = store_with(
            StoreRepr::Dense,
            vec![NodeBuilder::new(0, vec![1, 1]), NodeBuilder::placeholder(1)],
            1,
        );
        reconstruct(
            &exec,
            &crate::metrics::NoopMetrics,
            &mut store,
            &[vec![0]],
            1,
            NeighborsSortingStrategy::LeaveUnsorted,
        )
        .unwrap();
        let frozen = store.freeze_with(|n| n.freeze(StoredGraphDir::BothInOut));
        assert_eq!(frozen.get(1).unwrap().inbound_neighbors(), &[0, 0]);
    }
}
