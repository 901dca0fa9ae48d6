//! Build-time collections.
//!
//! - `id_set`: word-packed atomic set of node ids, used for implicit-node detection

pub mod id_set;

pub use id_set::CompactIdSet;
