//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent structural violations of the organization tree.
/// They carry no presentation text beyond a short diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NotFound(NodeId),

    #[error("maximum depth exceeded: levels are limited to {max}")]
    DepthExceeded { max: u8 },

    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// Reserved for reparenting: the new parent is the node itself or one of its descendants.
    #[error("invalid parent: {0}")]
    InvalidParent(NodeId),
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
