//! Concurrency building blocks for the construction pipeline.
//!
//! - `executor`: bounded worker pool; every call is a join barrier
//! - `counters`: per-id atomic counters, reused as lock-free write cursors

pub mod counters;
pub mod executor;

pub use counters::DegreeCounters;
pub use executor::BoundedExecutor;
