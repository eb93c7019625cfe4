//! Reconciliation logic for Node OS labels.
//!
//! One reconcile fetches the node, derives its OS label from
//! `status.nodeInfo.osImage` and writes the label back if it is missing.
//! The two races a write can lose (the node changed, or was deleted, since it
//! was read) are reported as [`ReconcileOutcome::Requeue`] instead of errors.

use crate::error::ControllerError;
use crate::labels::{self, LABEL_VALUE};
use node_store::{NodeStoreError, NodeStoreTrait};
use std::fmt;
use tracing::{debug, info, warn};

/// Why a reconcile asked to be run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueReason {
    /// The node was modified between our read and our write.
    Conflict,
    /// The node was deleted between our read and our write.
    NodeDeleted,
}

/// Result of a single reconcile that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The node no longer exists; nothing to do.
    NodeGone,
    /// The kubelet has not reported an OS image yet.
    AwaitingOsImage,
    /// The node already carries its OS label.
    Unchanged {
        /// Label key that was found
        label: String,
    },
    /// The OS label was written to the node.
    Labeled {
        /// Label key that was added
        label: String,
    },
    /// A benign race was hit while writing; the whole procedure should run again.
    Requeue(RequeueReason),
}

impl ReconcileOutcome {
    /// Short name used for logging and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeGone => "node_gone",
            Self::AwaitingOsImage => "awaiting_os_image",
            Self::Unchanged { .. } => "unchanged",
            Self::Labeled { .. } => "labeled",
            Self::Requeue(RequeueReason::Conflict) => "requeue_conflict",
            Self::Requeue(RequeueReason::NodeDeleted) => "requeue_node_deleted",
        }
    }

    /// OS label the outcome refers to, if one was derived.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Unchanged { label } | Self::Labeled { label } => Some(label),
            Self::NodeGone | Self::AwaitingOsImage | Self::Requeue(_) => None,
        }
    }
}

/// Reconciles OS labels on nodes.
pub struct Reconciler {
    pub(crate) node_store: Box<dyn NodeStoreTrait + Send + Sync>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler over the given node store.
    pub fn new(node_store: Box<dyn NodeStoreTrait + Send + Sync>) -> Self {
        Self { node_store }
    }

    /// Reconciles the OS label of the node called `name`.
    ///
    /// Issues at most one update call. Running it again on a node whose OS
    /// image has not changed returns `Unchanged` without writing.
    pub async fn reconcile_node(&self, name: &str) -> Result<ReconcileOutcome, ControllerError> {
        let mut node = match self.node_store.get(name).await {
            Ok(node) => node,
            Err(NodeStoreError::NotFound(_)) => {
                // Deleted nodes still produce events; nothing left to label
                debug!("Node {} not found, skipping", name);
                return Ok(ReconcileOutcome::NodeGone);
            }
            Err(e) => {
                debug!("unable to fetch Node {}: {}", name, e);
                return Err(ControllerError::FetchNode { name: name.to_string(), source: e });
            }
        };

        let Some(os_image) = labels::os_image(&node) else {
            debug!("Node {} has not reported an OS image yet", name);
            return Ok(ReconcileOutcome::AwaitingOsImage);
        };
        let label = labels::os_label_key(os_image);

        if labels::has_os_label(node.metadata.labels.as_ref(), &label) {
            info!("no update required for Node {} ({})", name, label);
            return Ok(ReconcileOutcome::Unchanged { label });
        }

        node.metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert(label.clone(), LABEL_VALUE.to_string());
        info!("adding label {} to Node {}", label, name);

        match self.node_store.update(&node).await {
            Ok(_) => Ok(ReconcileOutcome::Labeled { label }),
            Err(NodeStoreError::Conflict(_)) => {
                warn!("Node {} changed since it was read, requeueing", name);
                Ok(ReconcileOutcome::Requeue(RequeueReason::Conflict))
            }
            Err(NodeStoreError::NotFound(_)) => {
                // Next attempt hits the not-found path on read and settles
                warn!("Node {} was deleted since it was read, requeueing", name);
                Ok(ReconcileOutcome::Requeue(RequeueReason::NodeDeleted))
            }
            Err(e) => {
                debug!("unable to update Node {}: {}", name, e);
                Err(ControllerError::UpdateNode { name: name.to_string(), source: e })
            }
        }
    }
}
