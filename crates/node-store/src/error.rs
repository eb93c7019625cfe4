//! Node store errors

use thiserror::Error;

/// Errors that can occur when reading or writing nodes
#[derive(Debug, Error)]
pub enum NodeStoreError {
    /// The node does not exist (HTTP 404)
    #[error("Node not found: {0}")]
    NotFound(String),

    /// The node changed since it was read (HTTP 409)
    #[error("Node modified concurrently: {0}")]
    Conflict(String),

    /// The node object cannot be written as given
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Kubernetes client or API error other than 404/409
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Store failure that did not come from the Kubernetes client
    #[error("Node store unavailable: {0}")]
    Unavailable(String),
}

impl NodeStoreError {
    /// Whether the error reports a missing node
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the error reports an optimistic-concurrency conflict
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
