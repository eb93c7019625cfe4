//! Mock node store for unit testing
//!
//! This module provides an in-memory implementation of `NodeStoreTrait` that
//! can be used in unit tests without a running cluster. Writes are checked
//! against `resourceVersion` the same way the API server checks them, and
//! failures can be queued up front to exercise error paths.

use crate::error::NodeStoreError;
use crate::node_store_trait::NodeStoreTrait;
use k8s_openapi::api::core::v1::Node;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock node store for testing
#[derive(Clone, Debug, Default)]
pub struct MockNodeStore {
    // In-memory storage keyed by node name
    nodes: Arc<Mutex<HashMap<String, Node>>>,
    get_failures: Arc<Mutex<VecDeque<NodeStoreError>>>,
    update_failures: Arc<Mutex<VecDeque<NodeStoreError>>>,
    get_calls: Arc<Mutex<usize>>,
    update_calls: Arc<Mutex<usize>>,
    // Counter for generating resource versions
    next_resource_version: Arc<Mutex<u64>>,
}

impl MockNodeStore {
    /// Create an empty mock store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the mock store (for test setup)
    ///
    /// A fresh `resourceVersion` is assigned, replacing any the node carried.
    pub fn add_node(&self, mut node: Node) {
        let name = node.metadata.name.clone().unwrap_or_default();
        node.metadata.resource_version = Some(self.next_resource_version());
        self.nodes.lock().unwrap().insert(name, node);
    }

    /// Remove a node, as if it was deleted from the cluster
    pub fn remove_node(&self, name: &str) -> Option<Node> {
        self.nodes.lock().unwrap().remove(name)
    }

    /// Current stored copy of a node
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Node> {
        self.nodes.lock().unwrap().get(name).cloned()
    }

    /// Bump a node's `resourceVersion`, as a concurrent writer would
    pub fn touch(&self, name: &str) {
        let version = self.next_resource_version();
        if let Some(node) = self.nodes.lock().unwrap().get_mut(name) {
            node.metadata.resource_version = Some(version);
        }
    }

    /// Make the next `get` call fail with the given error
    pub fn fail_next_get(&self, error: NodeStoreError) {
        self.get_failures.lock().unwrap().push_back(error);
    }

    /// Make the next `update` call fail with the given error
    pub fn fail_next_update(&self, error: NodeStoreError) {
        self.update_failures.lock().unwrap().push_back(error);
    }

    /// Number of `get` calls issued so far
    #[must_use]
    pub fn get_calls(&self) -> usize {
        *self.get_calls.lock().unwrap()
    }

    /// Number of `update` calls issued so far, failed ones included
    #[must_use]
    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }

    fn next_resource_version(&self) -> String {
        let mut version = self.next_resource_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }
}

#[async_trait::async_trait]
impl NodeStoreTrait for MockNodeStore {
    async fn get(&self, name: &str) -> Result<Node, NodeStoreError> {
        *self.get_calls.lock().unwrap() += 1;
        if let Some(error) = self.get_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.nodes
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| NodeStoreError::NotFound(name.to_string()))
    }

    async fn update(&self, node: &Node) -> Result<Node, NodeStoreError> {
        *self.update_calls.lock().unwrap() += 1;
        if let Some(error) = self.update_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let name = node
            .metadata
            .name
            .clone()
            .ok_or_else(|| NodeStoreError::InvalidNode("node has no metadata.name".to_string()))?;
        let version = self.next_resource_version();

        let mut nodes = self.nodes.lock().unwrap();
        let stored = nodes
            .get(&name)
            .ok_or_else(|| NodeStoreError::NotFound(name.clone()))?;
        if node.metadata.resource_version.is_some()
            && node.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(NodeStoreError::Conflict(name));
        }

        let mut updated = node.clone();
        updated.metadata.resource_version = Some(version);
        nodes.insert(name, updated.clone());
        Ok(updated)
    }
}
