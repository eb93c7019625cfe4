//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the node store,
//! reconciler, watcher and probe servers together and supervises the
//! background tasks they run in.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::{self, Readiness};
use crate::reconciler::Reconciler;
use crate::watcher::{Context, Watcher};
use k8s_openapi::api::core::v1::Node;
use kube::{Api, Client};
use node_store::KubeNodeStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for node OS labels.
#[derive(Debug)]
pub struct Controller {
    node_watcher: JoinHandle<Result<(), ControllerError>>,
    health_server: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing OS Labeler");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        // Nodes are cluster scoped; this is the only kind we watch
        let node_api: Api<Node> = Api::all(kube_client);

        let metrics = Arc::new(Metrics::new()?);
        let readiness = Readiness::default();

        let context = Arc::new(Context {
            reconciler: Reconciler::new(Box::new(KubeNodeStore::new(node_api.clone()))),
            metrics: metrics.clone(),
            requeue_after: config.requeue_after,
            error_requeue_after: config.error_requeue_after,
        });

        let watcher = Watcher::new(
            node_api,
            context,
            readiness.clone(),
            config.concurrency,
            config.debounce,
        );

        let node_watcher = tokio::spawn(async move { watcher.watch_nodes().await });

        let health_server = {
            let router = probes::health_router(readiness);
            let addr = config.health_probe_bind_address;
            tokio::spawn(async move { probes::serve("Health probe", addr, router).await })
        };

        let metrics_server = {
            let router = probes::metrics_router(metrics);
            let addr = config.metrics_bind_address;
            tokio::spawn(async move { probes::serve("Metrics", addr, router).await })
        };

        Ok(Self { node_watcher, health_server, metrics_server })
    }

    /// Runs the controller until shutdown.
    ///
    /// Returns when the node watcher stops after a shutdown signal, or as
    /// soon as either HTTP server fails.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("OS Labeler running");

        tokio::select! {
            result = &mut self.node_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Node watcher panicked: {}", e)))??;
            }
            result = &mut self.health_server => {
                result.map_err(|e| ControllerError::Watch(format!("Health probe server panicked: {}", e)))??;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Watch(format!("Metrics server panicked: {}", e)))??;
            }
        }

        self.health_server.abort();
        self.metrics_server.abort();
        info!("OS Labeler stopped");
        Ok(())
    }
}
