//! Node Store
//!
//! Read and update access to Kubernetes `Node` objects for the OS labeler.
//!
//! The controller never talks to `kube::Api<Node>` directly. It goes through
//! [`NodeStoreTrait`], which narrows the API server down to the two calls a
//! reconcile needs and classifies the two benign races (`NotFound`,
//! `Conflict`) into dedicated error variants.
//!
//! # Example
//!
//! ```no_run
//! use k8s_openapi::api::core::v1::Node;
//! use kube::{Api, Client};
//! use node_store::{KubeNodeStore, NodeStoreError, NodeStoreTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::try_default().await?;
//! let store = KubeNodeStore::new(Api::<Node>::all(client));
//!
//! match store.get("worker-1").await {
//!     Ok(node) => println!("found {:?}", node.metadata.name),
//!     Err(NodeStoreError::NotFound(name)) => println!("{name} is gone"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **test-util**: exposes [`MockNodeStore`], an in-memory store that
//!   enforces `resourceVersion` checks and can be told to fail.

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod node_store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeNodeStore;
pub use error::NodeStoreError;
pub use node_store_trait::NodeStoreTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNodeStore;
