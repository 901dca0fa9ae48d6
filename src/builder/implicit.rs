//! Implicit nodes: ids that only ever appear as somebody's neighbor.
//!
//! Marking runs in parallel, one task per partition. Populating the store
//! (explicit nodes first, then placeholders) runs on a single thread so the
//! store itself never needs to be concurrent.

use crate::builder::ingest::{BuildStats, PartitionBatch};
use crate::collections::CompactIdSet;
use crate::concurrency::BoundedExecutor;
use crate::error::Result;
use crate::graph::{NodeBuilder, NodeStore, StoreRepr};
use crate::NodeId;

/// Store contents after population.
pub(crate) struct Populated {
    pub(crate) store: NodeStore<NodeBuilder>,
    /// Explicit ids, grouped by the partition they came from.
    pub(crate) partitions: Vec<Vec<NodeId>>,
    /// Ids materialized as empty placeholders, ascending.
    pub(crate) placeholders: Vec<NodeId>,
}

/// Marks every node id and every supplied neighbor id.
pub(crate) fn mark_ids(
    exec: &BoundedExecutor,
    batches: &[PartitionBatch],
    max_id: NodeId,
) -> Result<CompactIdSet> {
    let ids = CompactIdSet::new(max_id);
    exec.for_each("mark-implicit-nodes", batches, |batch| {
        for node in &batch.nodes {
            ids.insert(node.id());
            for &n in node.supplied() {
                ids.insert(n);
            }
        }
    })?;
    Ok(ids)
}

/// Moves the explicit nodes into a new store, then adds a placeholder for
/// every marked id that has no node yet.
pub(crate) fn populate_store(
    batches: Vec<PartitionBatch>,
    ids: &CompactIdSet,
    repr: StoreRepr,
    stats: &BuildStats,
) -> Result<Populated> {
    let expected = usize::try_from(stats.num_nodes).unwrap_or(usize::MAX).max(ids.len());
    let mut store = NodeStore::new(repr, stats.max_id, expected);

    let mut partitions = Vec::with_capacity(batches.len());
    for batch in batches {
        let mut explicit = Vec::with_capacity(batch.nodes.len());
        for node in batch.nodes {
            explicit.push(node.id());
            store.insert(node)?;
        }
        partitions.push(explicit);
    }

    let mut placeholders = Vec::new();
    for id in ids {
        if !store.contains(id) {
            store.insert(NodeBuilder::placeholder(id))?;
            placeholders.push(id);
        }
    }
    tracing::debug!(
        explicit = stats.num_nodes,
        implicit = placeholders.len(),
        "populated node store"
    );

    Ok(Populated {
        store,
        partitions,
        placeholders,
    })
}
