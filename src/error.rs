//! Construction errors.
//!
//! Every failure aborts the whole build: no partially-built graph is ever
//! handed back to the caller.

use crate::NodeId;

/// The error type for graph construction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The same explicit id was supplied more than once (e.g. in two partitions).
    #[error("node {id} was supplied more than once")]
    DuplicateNode {
        /// The offending id.
        id: NodeId,
    },

    /// A record could not be turned into a node.
    #[error("malformed record for id {id}: {reason}")]
    MalformedRecord {
        /// The raw id carried by the record.
        id: i64,
        /// What was wrong with it.
        reason: String,
    },

    /// The build configuration is unusable.
    #[error("invalid build configuration: {0}")]
    InvalidConfig(String),

    /// The configuration document could not be parsed.
    #[error("failed to parse build configuration")]
    Config(#[from] serde_json::Error),

    /// The worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    Executor(String),

    /// A worker task panicked while running a pipeline stage.
    #[error("worker task panicked during `{stage}`")]
    TaskPanicked {
        /// The pipeline stage that was running.
        stage: &'static str,
    },
}

/// Shorthand for results carrying a [`BuildError`].
pub type Result<T> = core::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = BuildError::DuplicateNode { id: 7 };
        assert_eq!(err.to_string(), "node 7 was supplied more than once");

        let err = BuildError::TaskPanicked { stage: "populate-in-edges" };
        assert!(err.to_string().contains("populate-in-edges"));
    }
}
