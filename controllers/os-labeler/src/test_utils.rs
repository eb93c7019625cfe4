//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test nodes and wiring a
//! reconciler to an in-memory node store.

#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use k8s_openapi::api::core::v1::{Node, NodeStatus, NodeSystemInfo};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use node_store::MockNodeStore;
#[cfg(test)]
use std::collections::BTreeMap;

/// Helper to create a test Node
///
/// `os_image` of `None` leaves `status` unset, as on a node the kubelet has
/// not reported for yet.
#[cfg(test)]
pub fn create_test_node(name: &str, os_image: Option<&str>, labels: Option<&[(&str, &str)]>) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: labels.map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>()
            }),
            ..Default::default()
        },
        status: os_image.map(|image| NodeStatus {
            node_info: Some(NodeSystemInfo {
                os_image: image.to_string(),
                operating_system: "linux".to_string(),
                architecture: "amd64".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Helper to create a reconciler over a mock store holding `nodes`
///
/// The returned store shares state with the one inside the reconciler.
#[cfg(test)]
pub fn create_test_reconciler(nodes: Vec<Node>) -> (Reconciler, MockNodeStore) {
    let store = MockNodeStore::new();
    for node in nodes {
        store.add_node(node);
    }
    (Reconciler::new(Box::new(store.clone())), store)
}
