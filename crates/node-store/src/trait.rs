//! NodeStore trait for mocking
//!
//! This trait abstracts node reads and writes so the reconciler can run
//! against the API server in production and an in-memory store in tests.

use crate::error::NodeStoreError;
use k8s_openapi::api::core::v1::Node;

/// Trait for node store operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait NodeStoreTrait: Send + Sync {
    /// Fetch the current state of a node by name.
    ///
    /// Returns `NodeStoreError::NotFound` when the node does not exist.
    async fn get(&self, name: &str) -> Result<Node, NodeStoreError>;

    /// Replace a node with the given object.
    ///
    /// The write carries the object's `resourceVersion`; if the stored node
    /// changed since that version was read the call fails with
    /// `NodeStoreError::Conflict`. A node deleted in the meantime fails with
    /// `NodeStoreError::NotFound`.
    async fn update(&self, node: &Node) -> Result<Node, NodeStoreError>;
}
