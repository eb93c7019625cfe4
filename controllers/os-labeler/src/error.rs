//! Controller-specific error types.
//!
//! This module defines error types specific to the OS labeler that are not
//! covered by upstream library errors.

use kube::Error as KubeError;
use node_store::NodeStoreError;
use thiserror::Error;

/// Errors that can occur in the OS labeler.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Reading the node failed for a reason other than it being gone
    #[error("unable to fetch Node {name}: {source}")]
    FetchNode {
        /// Node name
        name: String,
        /// Underlying store error
        #[source]
        source: NodeStoreError,
    },

    /// Writing the label failed for a reason other than a benign race
    #[error("unable to update Node {name}: {source}")]
    UpdateNode {
        /// Node name
        name: String,
        /// Underlying store error
        #[source]
        source: NodeStoreError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe or metrics server failed
    #[error("HTTP server error: {0}")]
    Server(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
