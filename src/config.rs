//! Build configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Which edge direction(s) the finished graph answers queries about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoredGraphDir {
    /// Input neighbors are in-neighbors; only in-edges are stored.
    OnlyIn,
    /// Input neighbors are out-neighbors; only out-edges are stored.
    #[default]
    OnlyOut,
    /// Input neighbors are out-neighbors; in-edges are derived from them.
    BothInOut,
}

impl StoredGraphDir {
    /// Returns `true` if in-edges have to be reconstructed from out-edges.
    #[inline]
    pub fn derives_in_edges(self) -> bool {
        matches!(self, Self::BothInOut)
    }
}

/// How neighbor arrays are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NeighborsSortingStrategy {
    /// The input is already sorted; supplied arrays are left as they are.
    AlreadySorted,
    /// Supplied arrays are sorted while reading.
    SortWhileReading,
    /// Nothing is sorted.
    #[default]
    LeaveUnsorted,
}

impl NeighborsSortingStrategy {
    /// Whether supplied neighbor arrays are sorted during ingestion.
    #[inline]
    pub fn sorts_on_read(self) -> bool {
        matches!(self, Self::SortWhileReading)
    }

    /// Whether derived in-neighbor arrays are sorted after placement.
    #[inline]
    pub fn sorts_derived(self) -> bool {
        !matches!(self, Self::LeaveUnsorted)
    }
}

/// Parameters for [`GraphBuilder`](crate::GraphBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Maximum number of concurrently running build tasks.
    pub parallelism: usize,
    /// Which direction(s) to store.
    pub stored_dir: StoredGraphDir,
    /// Neighbor ordering.
    pub sorting: NeighborsSortingStrategy,
    /// `Some(true)` forces sparse storage, `Some(false)` dense, `None` picks by density.
    pub force_sparse: Option<bool>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism().map_or(1, usize::from),
            stored_dir: StoredGraphDir::default(),
            sorting: NeighborsSortingStrategy::default(),
            force_sparse: None,
        }
    }
}

impl BuildConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`BuildError::Config`] on malformed JSON and
    /// [`BuildError::InvalidConfig`] if the result does not validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the parallelism limit.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Sets the stored direction.
    #[must_use]
    pub fn with_stored_dir(mut self, stored_dir: StoredGraphDir) -> Self {
        self.stored_dir = stored_dir;
        self
    }

    /// Sets the sorting strategy.
    #[must_use]
    pub fn with_sorting(mut self, sorting: NeighborsSortingStrategy) -> Self {
        self.sorting = sorting;
        self
    }

    /// Overrides the dense/sparse storage decision.
    #[must_use]
    pub fn with_force_sparse(mut self, force_sparse: Option<bool>) -> Self {
        self.force_sparse = force_sparse;
        self
    }

    /// Checks that the configuration can drive a build.
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidConfig`] if `parallelism` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(BuildError::InvalidConfig(
                "parallelism must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}
