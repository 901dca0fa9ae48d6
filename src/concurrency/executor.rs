//! Bounded parallel executor.
//!
//! Every pipeline stage fans out through a [`BoundedExecutor`]. It owns a
//! rayon pool with exactly `limit` workers, so no matter how many partitions
//! the caller hands in, at most `limit` build tasks run at once and the rest
//! queue. Each call returns only after all of its tasks have finished; that
//! return is the join barrier between stages.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::error::{BuildError, Result};

/// A fixed-size worker pool that turns task panics into [`BuildError`]s.
pub struct BoundedExecutor {
    pool: rayon::ThreadPool,
    limit: usize,
}

impl BoundedExecutor {
    /// Starts a pool running at most `limit` tasks concurrently.
    ///
    /// # Errors
    /// [`BuildError::InvalidConfig`] if `limit` is zero, [`BuildError::Executor`]
    /// if the pool cannot be created.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(BuildError::InvalidConfig(
                "parallelism must be greater than zero".to_owned(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(limit)
            .thread_name(|i| format!("bulkgraph-build-{i}"))
            .build()
            .map_err(|e| BuildError::Executor(e.to_string()))?;
        Ok(Self { pool, limit })
    }

    /// Maximum number of concurrently running tasks.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `f` inside the pool and waits for it, including every parallel
    /// task it spawns.
    ///
    /// # Errors
    /// [`BuildError::TaskPanicked`] if `f` or any task it spawned panicked.
    pub fn install<R, F>(&self, stage: &'static str, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(f)))
            .map_err(|_| {
                tracing::error!(stage, "worker task panicked");
                BuildError::TaskPanicked { stage }
            })
    }

    /// Maps every item through `f` in parallel, keeping input order.
    ///
    /// # Errors
    /// The first error returned by `f`, or [`BuildError::TaskPanicked`].
    pub fn try_map<T, R, F>(&self, stage: &'static str, items: Vec<T>, f: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync + Send,
    {
        self.install(stage, || items.into_par_iter().map(&f).collect::<Result<Vec<R>>>())?
    }

    /// Runs `f` on every item in parallel.
    ///
    /// # Errors
    /// [`BuildError::TaskPanicked`] if any task panicked.
    pub fn for_each<T, F>(&self, stage: &'static str, items: &[T], f: F) -> Result<()>
    where
        T: Sync,
        F: Fn(&T) + Sync + Send,
    {
        self.install(stage, || items.par_iter().for_each(&f))
    }
}

impl core::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundedExecutor").field("limit", &self.limit).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(BoundedExecutor::new(0), Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn never_exceeds_limit() {
        let exec = BoundedExecutor::new(2).unwrap();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<usize> = (0..32).collect();

        exec.for_each("probe", &items, |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn try_map_keeps_order_and_stops_on_error() {
        let exec = BoundedExecutor::new(3).unwrap();
        let out = exec.try_map("double", (0..100).collect(), |x: u32| Ok(x * 2)).unwrap();
        assert_eq!(out, (0..100).map(|x| x * 2).collect::<Vec<_>>());

        let err = exec
            .try_map("dup", vec![1u32, 2, 3], |x| {
                if x == 2 {
                    Err(BuildError::DuplicateNode { id: x })
                } else {
                    Ok(x)
                }
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateNode { id: 2 }));
    }

    #[test]
    fn panicking_task_becomes_error() {
        let exec = BoundedExecutor::new(2).unwrap();
        let items = vec![0u32, 1, 2, 3];
        let err = exec
            .for_each("explode", &items, |&x| assert!(x != 3, "boom"))
            .unwrap_err();
        assert!(matches!(err, BuildError::TaskPanicked { stage: "explode" }));

        // The pool is still usable afterwards.
        assert_eq!(exec.install("after", || 7).unwrap(), 7);
    }
}
