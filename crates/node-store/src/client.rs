//! Node store backed by the Kubernetes API server

use crate::error::NodeStoreError;
use crate::node_store_trait::NodeStoreTrait;
use k8s_openapi::api::core::v1::Node;
use kube::Api;
use kube::api::PostParams;
use tracing::debug;

/// Field manager recorded on every node update.
pub const FIELD_MANAGER: &str = "os-labeler";

/// Node store that reads and replaces nodes through `kube::Api<Node>`.
#[derive(Clone)]
pub struct KubeNodeStore {
    api: Api<Node>,
    post_params: PostParams,
}

impl std::fmt::Debug for KubeNodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeNodeStore")
            .field("field_manager", &self.post_params.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeNodeStore {
    /// Create a store over a cluster-scoped node API.
    #[must_use]
    pub fn new(api: Api<Node>) -> Self {
        Self {
            api,
            post_params: PostParams {
                field_manager: Some(FIELD_MANAGER.to_string()),
                ..PostParams::default()
            },
        }
    }
}

/// Map a client error onto the store's error taxonomy.
///
/// 404 and 409 are the two races a reconcile is expected to hit; everything
/// else is passed through untouched.
pub(crate) fn classify(name: &str, error: kube::Error) -> NodeStoreError {
    match error {
        kube::Error::Api(ref response) if response.code == 404 => {
            NodeStoreError::NotFound(name.to_string())
        }
        kube::Error::Api(ref response) if response.code == 409 => {
            NodeStoreError::Conflict(name.to_string())
        }
        other => NodeStoreError::Kube(other),
    }
}

#[async_trait::async_trait]
impl NodeStoreTrait for KubeNodeStore {
    async fn get(&self, name: &str) -> Result<Node, NodeStoreError> {
        debug!("Fetching Node {}", name);
        self.api.get(name).await.map_err(|e| classify(name, e))
    }

    async fn update(&self, node: &Node) -> Result<Node, NodeStoreError> {
        let name = node
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| NodeStoreError::InvalidNode("node has no metadata.name".to_string()))?;
        debug!(
            "Replacing Node {} at resourceVersion {:?}",
            name, node.metadata.resource_version
        );
        self.api
            .replace(name, &self.post_params, node)
            .await
            .map_err(|e| classify(name, e))
    }
}
