//! Error types for httpdtree

use crate::node::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for httpdtree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for httpdtree
#[derive(Error, Debug)]
pub enum Error {
    /// The id does not refer to a live node
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// `delete_child` was given a node the block does not hold
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// A block-only operation was invoked on a comment or directive
    #[error("Node {0} is not a block")]
    NotABlock(NodeId),

    /// Comments carry no parameters
    #[error("Node {0} has no parameters")]
    NoParameters(NodeId),

    /// The storage adapter refused to write
    #[error("could not save configuration changes: {0}")]
    Persistence(#[from] PersistError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by a [`Persistence`](crate::node::Persistence) adapter.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The rendered file would not parse back
    #[error("invalid syntax in {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    /// The write itself failed
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dirty node has no storage location to be written to
    #[error("node {0} has no backing file")]
    Unbacked(NodeId),

    /// The adapter declined the change for another reason
    #[error("write to {} rejected: {message}", .path.display())]
    Rejected { path: PathBuf, message: String },
}
