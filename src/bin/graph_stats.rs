//! Builds a graph from adjacency-list files and prints its statistics.
//!
//! Each file is read as one partition. Set `RUST_LOG=bulkgraph=debug` to see
//! phase transitions.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use bulkgraph::reader::read_adjacency_file;
use bulkgraph::concurrency::BoundedExecutor;
use bulkgraph::{BuildConfig, GraphBuilder, NeighborsSortingStrategy, RecordingMetrics, StoredGraphDir};

#[cfg(feature = "alloc-mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "graph_stats")]
#[command(about = "Build a graph from adjacency-list partitions and report on it", long_about = None)]
struct Cli {
    /// Adjacency-list files, one partition each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON build configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which direction(s) to store
    #[arg(long, value_enum)]
    dir: Option<DirArg>,

    /// Neighbor sorting strategy
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Maximum number of concurrent build tasks
    #[arg(long)]
    threads: Option<usize>,

    /// Force sparse node storage
    #[arg(long, conflicts_with = "dense")]
    sparse: bool,

    /// Force dense node storage
    #[arg(long)]
    dense: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirArg {
    Out,
    In,
    Both,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    None,
    Read,
    Already,
}

impl Cli {
    fn build_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                BuildConfig::from_json_str(&text)
                    .with_context(|| format!("invalid configuration in {}", path.display()))?
            }
            None => BuildConfig::default(),
        };
        if let Some(dir) = self.dir {
            config.stored_dir = match dir {
                DirArg::Out => StoredGraphDir::OnlyOut,
                DirArg::In => StoredGraphDir::OnlyIn,
                DirArg::Both => StoredGraphDir::BothInOut,
            };
        }
        if let Some(sort) = self.sort {
            config.sorting = match sort {
                SortArg::None => NeighborsSortingStrategy::LeaveUnsorted,
                SortArg::Read => NeighborsSortingStrategy::SortWhileReading,
                SortArg::Already => NeighborsSortingStrategy::AlreadySorted,
            };
        }
        if let Some(threads) = self.threads {
            config.parallelism = threads;
        }
        if self.sparse {
            config.force_sparse = Some(true);
        } else if self.dense {
            config.force_sparse = Some(false);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.build_config()?;

    let partitions = cli
        .files
        .iter()
        .map(|path| {
            read_adjacency_file(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let exec = Arc::new(BoundedExecutor::new(config.parallelism)?);
    let metrics = Arc::new(RecordingMetrics::new());
    let builder = GraphBuilder::new(config)
        .with_metrics(metrics.clone())
        .with_executor(Arc::clone(&exec));
    let graph = builder.build(partitions).context("graph construction failed")?;

    println!("partitions:   {}", cli.files.len());
    println!("direction:    {:?}", graph.stored_direction());
    println!("storage:      {:?}", graph.storage_repr());
    println!("nodes:        {}", graph.node_count());
    println!("edges:        {}", graph.edge_count());
    println!("max node id:  {}", graph.max_node_id());
    println!("sorting:      {:?}", builder.config().sorting);
    println!("threads:      {}", exec.limit());
    println!();
    for (phase, elapsed) in metrics.phases() {
        println!("{phase:<22} {:>10.3} ms", elapsed.as_secs_f64() * 1e3);
    }
    Ok(())
}
