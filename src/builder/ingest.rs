//! Ingestion: records to build-time nodes, one partition per task.

use num_traits::ToPrimitive;

use crate::config::NeighborsSortingStrategy;
use crate::error::{BuildError, Result};
use crate::graph::NodeBuilder;
use crate::record::NodeRecord;
use crate::NodeId;

/// Running totals for a set of nodes.
///
/// Combining takes the max of `max_id` and sums the counts, so the
/// aggregate does not depend on partition order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Largest id seen, as a node or as a neighbor.
    pub max_id: NodeId,
    /// Number of explicit nodes.
    pub num_nodes: u64,
    /// Number of supplied edges.
    pub num_edges: u64,
}

impl BuildStats {
    /// Merges two aggregates.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            max_id: self.max_id.max(other.max_id),
            num_nodes: self.num_nodes + other.num_nodes,
            num_edges: self.num_edges + other.num_edges,
        }
    }

    fn observe(&mut self, max_id: NodeId, degree: usize) {
        self.max_id = self.max_id.max(max_id);
        self.num_nodes += 1;
        self.num_edges += degree as u64;
    }
}

impl core::iter::Sum for BuildStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::combine)
    }
}

/// The nodes read from one partition, plus their stats.
#[derive(Debug, Default)]
pub(crate) struct PartitionBatch {
    pub(crate) nodes: Vec<NodeBuilder>,
    pub(crate) stats: BuildStats,
}

/// Reads one partition.
pub(crate) fn ingest_partition<I>(records: I, sorting: NeighborsSortingStrategy) -> Result<PartitionBatch>
where
    I: IntoIterator<Item = NodeRecord>,
{
    let records = records.into_iter();
    let mut batch = PartitionBatch {
        nodes: Vec::with_capacity(records.size_hint().0),
        stats: BuildStats::default(),
    };
    for record in records {
        let (node, max_id) = convert(record, sorting.sorts_on_read())?;
        batch.stats.observe(max_id, node.supplied().len());
        batch.nodes.push(node);
    }
    Ok(batch)
}

fn to_node_id(raw: i64, owner: i64, what: &str) -> Result<NodeId> {
    raw.to_u32().ok_or_else(|| BuildError::MalformedRecord {
        id: owner,
        reason: format!("{what} {raw} is not in [0, {}]", NodeId::MAX),
    })
}

fn convert(record: NodeRecord, sort: bool) -> Result<(NodeBuilder, NodeId)> {
    let id = to_node_id(record.id, record.id, "id")?;
    let mut neighbors = record
        .out_neighbors
        .iter()
        .map(|&n| to_node_id(n, record.id, "neighbor"))
        .collect::<Result<Vec<NodeId>>>()?;

    let max_id = neighbors.iter().copied().fold(id, NodeId::max);
    if i64::from(max_id) != record.max_id {
        return Err(BuildError::MalformedRecord {
            id: record.id,
            reason: format!("declared max id {} but record references {max_id}", record.max_id),
        });
    }

    if sort {
        neighbors.sort_unstable();
    }
    Ok((NodeBuilder::new(id, neighbors), max_id))
}
