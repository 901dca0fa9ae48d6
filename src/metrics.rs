//! Phase timing sinks.
//!
//! The builder reports how long each pipeline phase took. Sinks are purely
//! observational; nothing they do can influence the graph being built.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Receives one duration event per completed pipeline phase.
pub trait BuildMetrics: Send + Sync {
    /// Called once a phase has finished.
    fn record_phase(&self, phase: &'static str, elapsed: Duration);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl BuildMetrics for NoopMetrics {
    #[inline]
    fn record_phase(&self, _phase: &'static str, _elapsed: Duration) {}
}

/// Keeps every event, in the order phases completed.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    phases: Mutex<Vec<(&'static str, Duration)>>,
}

impl RecordingMetrics {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded `(phase, duration)` pairs.
    pub fn phases(&self) -> Vec<(&'static str, Duration)> {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded phase names, in order.
    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases().into_iter().map(|(name, _)| name).collect()
    }
}

impl BuildMetrics for RecordingMetrics {
    fn record_phase(&self, phase: &'static str, elapsed: Duration) {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((phase, elapsed));
    }
}

/// Runs `f` as the phase `phase`, reporting its duration to `metrics` and the log.
pub(crate) fn timed<R>(metrics: &dyn BuildMetrics, phase: &'static str, f: impl FnOnce() -> R) -> R {
    let _span = tracing::debug_span!("phase", phase).entered();
    tracing::debug!(phase, "phase started");
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    metrics.record_phase(phase, elapsed);
    tracing::debug!(phase, elapsed_ms = elapsed.as_secs_f64() * 1e3, "phase finished");
    out
}
