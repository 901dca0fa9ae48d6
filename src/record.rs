//! Input records.
//!
//! A [`NodeRecord`] is what a reader produces for one explicitly listed node:
//! its id, the ids of its neighbors on the supplied side, and the largest id
//! mentioned by the record. Raw ids are signed so that malformed input
//! (negative ids) can be represented and rejected during ingestion.

/// One explicitly listed node and its supplied neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// The node's id.
    pub id: i64,
    /// Neighbor ids on the supplied side (out-neighbors unless the graph
    /// stores only in-edges).
    pub out_neighbors: Vec<i64>,
    /// `max(id, max(out_neighbors))`.
    pub max_id: i64,
}

impl NodeRecord {
    /// Creates a record, computing `max_id` from `id` and `out_neighbors`.
    pub fn new(id: i64, out_neighbors: Vec<i64>) -> Self {
        let max_id = out_neighbors.iter().copied().fold(id, i64::max);
        Self {
            id,
            out_neighbors,
            max_id,
        }
    }
}

impl From<(i64, Vec<i64>)> for NodeRecord {
    fn from((id, out_neighbors): (i64, Vec<i64>)) -> Self {
        Self::new(id, out_neighbors)
    }
}
