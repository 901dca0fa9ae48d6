//! # `bulkgraph` - Parallel Bulk Graph Construction
//!
//! Builds immutable, id-indexed directed graphs from partitioned streams of
//! adjacency records, for in-memory analytics over large graphs.
//!
//! ## Pipeline
//!
//! Input arrives as partitions of [`NodeRecord`]s (an id plus its supplied
//! neighbors). [`GraphBuilder::build`] runs a strict sequence of stages, each
//! fanned out over a bounded worker pool and closed by a join barrier:
//!
//! 1. **Ingestion**: records become build-time nodes, optionally with sorted
//!    neighbors; per-partition stats are aggregated.
//! 2. **Implicit nodes**: every referenced id is marked in a word-packed
//!    atomic bitset; ids without a record become empty placeholder nodes.
//! 3. **Store population**: single-threaded, into a dense array or a sparse
//!    hash map picked by a density heuristic (or forced by configuration).
//! 4. **In-edge reconstruction** (both directions only): per-id atomic
//!    counters first size every in-edge array exactly, then serve as
//!    lock-free write cursors while sources are placed.
//! 5. **Freeze**: every node is converted into its read-only form.
//!
//! ## Invariants
//!
//! - Every id referenced anywhere is a node of the finished graph.
//! - `edge_count` is the number of supplied edges, doubled when both
//!   directions are stored.
//! - Construction is all-or-nothing: any error aborts the build.
//! - A [`DirectedGraph`] has no mutation path and is `Send + Sync`.
//!
//! ## Example
//!
//! ```rust
//! use bulkgraph::{BuildConfig, GraphBuilder, NodeRecord, StoredGraphDir};
//!
//! let partitions = vec![
//!     vec![NodeRecord::new(1, vec![2, 3])],
//!     vec![NodeRecord::new(2, vec![3])],
//! ];
//! let graph = GraphBuilder::new(BuildConfig::default().with_stored_dir(StoredGraphDir::OnlyOut))
//!     .build(partitions)
//!     .unwrap();
//!
//! assert_eq!(graph.max_node_id(), 3);
//! assert_eq!(graph.node_count(), 3);
//! assert!(graph.get_node_by_id(3).unwrap().outbound_neighbors().is_empty());
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod builder;
pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod reader;
pub mod record;

/// Node identifier as stored in a built graph.
pub type NodeId = u32;

pub use builder::{build_graph, BuildStats, GraphBuilder};
pub use config::{BuildConfig, NeighborsSortingStrategy, StoredGraphDir};
pub use error::{BuildError, Result};
pub use graph::{DirectedGraph, EdgeDir, Node, StoreRepr};
pub use metrics::{BuildMetrics, NoopMetrics, RecordingMetrics};
pub use record::NodeRecord;

// Layout claims the memory-footprint argument relies on.
const _: () = {
    use core::mem;

    // Ids and in-edge slots share a width.
    assert!(mem::size_of::<NodeId>() == mem::size_of::<core::sync::atomic::AtomicU32>());
    // A frozen node is an id plus two optional boxed slices (niche-optimized).
    assert!(mem::size_of::<Node>() <= mem::size_of::<usize>() * 5);
};
