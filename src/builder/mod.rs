//! The construction pipeline.
//!
//! [`GraphBuilder::build`] runs a fixed sequence of stages. Each stage fans
//! out over the bounded executor and the next one starts only after every
//! task of the previous one has joined:
//!
//! ```text
//! read-out-edges ─▶ mark-implicit-nodes ─▶ populate-store
//!     ─▶ [find-in-edge-sizes ─▶ instantiate-in-edges ─▶ populate-in-edges ─▶ sort-in-edges]
//!     ─▶ freeze-nodes ─▶ DirectedGraph
//! ```
//!
//! The bracketed stages only run when both directions are stored. Any
//! failure aborts the build; nothing partially built is returned.

mod implicit;
mod in_edges;
mod ingest;

use std::sync::Arc;

pub use ingest::BuildStats;

use crate::concurrency::BoundedExecutor;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::graph::{DirectedGraph, StoreRepr};
use crate::metrics::{timed, BuildMetrics, NoopMetrics};
use crate::record::NodeRecord;

/// Builds [`DirectedGraph`]s from partitioned [`NodeRecord`] streams.
///
/// # Example
///
/// ```rust
/// use bulkgraph::{BuildConfig, GraphBuilder, NodeRecord, StoredGraphDir};
///
/// let partitions = vec![
///     vec![NodeRecord::new(1, vec![2, 3])],
///     vec![NodeRecord::new(2, vec![3])],
/// ];
/// let config = BuildConfig::default()
///     .with_parallelism(2)
///     .with_stored_dir(StoredGraphDir::BothInOut);
/// let graph = GraphBuilder::new(config).build(partitions).unwrap();
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 6);
/// let mut into_3 = graph.get_node_by_id(3).unwrap().inbound_neighbors().to_vec();
/// into_3.sort_unstable();
/// assert_eq!(into_3, vec![1, 2]);
/// ```
#[derive(Clone)]
pub struct GraphBuilder {
    config: BuildConfig,
    metrics: Arc<dyn BuildMetrics>,
    executor: Option<Arc<BoundedExecutor>>,
}

impl GraphBuilder {
    /// Creates a builder that reports phase timings nowhere.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(NoopMetrics),
            executor: None,
        }
    }

    /// Reports phase timings to `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn BuildMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Runs every build on `executor` instead of a pool started per build.
    ///
    /// The executor's limit takes the place of `config.parallelism`.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<BoundedExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// The configuration this builder runs with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs the whole pipeline and returns the finished graph.
    ///
    /// Blocks until every stage has completed.
    ///
    /// # Errors
    /// - [`BuildError::InvalidConfig`](crate::BuildError::InvalidConfig) / [`Executor`](crate::BuildError::Executor)
    ///   if the worker pool cannot be set up,
    /// - [`MalformedRecord`](crate::BuildError::MalformedRecord) for invalid input records,
    /// - [`DuplicateNode`](crate::BuildError::DuplicateNode) if an id is listed twice,
    /// - [`TaskPanicked`](crate::BuildError::TaskPanicked) if a worker task panicked.
    pub fn build<P>(&self, partitions: Vec<P>) -> Result<DirectedGraph>
    where
        P: IntoIterator<Item = NodeRecord> + Send,
    {
        self.config.validate()?;
        let BuildConfig {
            parallelism,
            stored_dir,
            sorting,
            force_sparse,
        } = self.config;
        let metrics = &*self.metrics;
        let owned;
        let exec = match &self.executor {
            Some(shared) => &**shared,
            None => {
                owned = BoundedExecutor::new(parallelism)?;
                &owned
            }
        };

        let _span = tracing::debug_span!(
            "build_graph",
            partitions = partitions.len(),
            ?stored_dir,
            ?sorting,
            parallelism = exec.limit(),
            shared_pool = self.executor.is_some()
        )
        .entered();

        let batches = timed(metrics, "read-out-edges", || {
            exec.try_map("read-out-edges", partitions, |p| ingest::ingest_partition(p, sorting))
        })?;
        let stats: BuildStats = batches.iter().map(|b| b.stats).sum();
        tracing::debug!(
            max_id = stats.max_id,
            nodes = stats.num_nodes,
            edges = stats.num_edges,
            "read all partitions"
        );

        let ids = timed(metrics, "mark-implicit-nodes", || {
            implicit::mark_ids(exec, &batches, stats.max_id)
        })?;

        let repr = StoreRepr::choose(force_sparse, stats.num_nodes, stats.max_id, stats.num_edges);
        let implicit::Populated {
            mut store,
            partitions,
            placeholders,
        } = timed(metrics, "populate-store", || {
            implicit::populate_store(batches, &ids, repr, &stats)
        })?;
        drop(ids);

        if stored_dir.derives_in_edges() {
            tracing::debug!(
                partitions = partitions.len(),
                placeholders = placeholders.len(),
                "reconstructing in-edges"
            );
            in_edges::reconstruct(exec, metrics, &mut store, &partitions, stats.max_id, sorting)?;
        }

        let store = timed(metrics, "freeze-nodes", || {
            exec.install("freeze-nodes", || store.freeze_with(|n| n.freeze(stored_dir)))
        })?;

        let edge_count = if stored_dir.derives_in_edges() {
            stats.num_edges * 2
        } else {
            stats.num_edges
        };
        let graph = DirectedGraph::new(stored_dir, stats.max_id, edge_count, store);
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            repr = ?graph.storage_repr(),
            "graph built"
        );
        Ok(graph)
    }
}

impl core::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish()
    }
}

/// Builds a graph with `config` and no metrics sink.
///
/// # Errors
/// See [`GraphBuilder::build`].
pub fn build_graph<P>(partitions: Vec<P>, config: BuildConfig) -> Result<DirectedGraph>
where
    P: IntoIterator<Item = NodeRecord> + Send,
{
    GraphBuilder::new(config).build(partitions)
}
