//! Graph storage.
//!
//! - `node`: two-phase node (`NodeBuilder` while building, `Node` once frozen)
//! - `store`: id-indexed dense/sparse node container
//! - `directed`: the read-only `DirectedGraph` façade

pub mod directed;
pub mod node;
pub mod store;

pub use directed::DirectedGraph;
pub use node::{EdgeDir, HasNodeId, Node, NodeBuilder};
pub use store::{NodeStore, StoreRepr};
