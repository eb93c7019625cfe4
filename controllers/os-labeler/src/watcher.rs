//! Kubernetes Node watcher.
//!
//! Drives the reconciler from a `kube_runtime::Controller` over all nodes in
//! the cluster. The runtime owns the watch, the cache, the work queue and
//! per-object serialisation; this module only maps reconcile outcomes onto
//! runtime actions.

use crate::error::ControllerError;
use crate::metrics::{ERROR_OUTCOME, Metrics};
use crate::probes::Readiness;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, controller::{Action, Config as ControllerConfig}, watcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconcile.
#[derive(Debug)]
pub struct Context {
    pub(crate) reconciler: Reconciler,
    pub(crate) metrics: Arc<Metrics>,
    /// Delay before re-running after a benign write race
    pub(crate) requeue_after: Duration,
    /// Delay before re-running after a failed reconcile
    pub(crate) error_requeue_after: Duration,
}

/// Map a successful reconcile onto the runtime's next action.
///
/// Settled outcomes wait for the next change to the node; races come back
/// after `requeue_after` and run the whole procedure again.
pub(crate) fn action_for(outcome: &ReconcileOutcome, requeue_after: Duration) -> Action {
    match outcome {
        ReconcileOutcome::Requeue(_) => Action::requeue(requeue_after),
        ReconcileOutcome::NodeGone
        | ReconcileOutcome::AwaitingOsImage
        | ReconcileOutcome::Unchanged { .. }
        | ReconcileOutcome::Labeled { .. } => Action::await_change(),
    }
}

async fn reconcile(node: Arc<Node>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = node.name_any();
    debug!("Reconciling Node {}", name);

    let started = Instant::now();
    let result = ctx.reconciler.reconcile_node(&name).await;
    let elapsed = started.elapsed();

    match result {
        Ok(outcome) => {
            ctx.metrics.observe(outcome.as_str(), elapsed);
            debug!(
                "Node {} reconciled: {} (label: {})",
                name,
                outcome.as_str(),
                outcome.label().unwrap_or("-")
            );
            Ok(action_for(&outcome, ctx.requeue_after))
        }
        Err(e) => {
            ctx.metrics.observe(ERROR_OUTCOME, elapsed);
            Err(e)
        }
    }
}

fn error_policy(node: Arc<Node>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    error!("Reconciliation error for Node {}: {}", node.name_any(), error);
    Action::requeue(ctx.error_requeue_after)
}

/// Watches Node resources for changes.
#[derive(Debug)]
pub struct Watcher {
    node_api: Api<Node>,
    context: Arc<Context>,
    readiness: Readiness,
    controller_config: ControllerConfig,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        node_api: Api<Node>,
        context: Arc<Context>,
        readiness: Readiness,
        concurrency: u16,
        debounce: Duration,
    ) -> Self {
        Self {
            node_api,
            context,
            readiness,
            controller_config: ControllerConfig::default()
                .debounce(debounce)
                .concurrency(concurrency),
        }
    }

    /// Watches Node resources until a shutdown signal arrives.
    pub async fn watch_nodes(&self) -> Result<(), ControllerError> {
        info!("Starting Node watcher");

        let controller = Controller::new(self.node_api.clone(), watcher::Config::default())
            .with_config(self.controller_config.clone())
            .shutdown_on_signal();

        // Ready once the initial node list has landed in the cache
        let store = controller.store();
        let readiness = self.readiness.clone();
        let ready = tokio::spawn(async move {
            if store.wait_until_ready().await.is_ok() {
                info!("Node cache synced");
                readiness.set_ready();
            }
        });

        controller
            .run(reconcile, error_policy, self.context.clone())
            .for_each(|res| async move {
                match res {
                    Ok((object, _)) => debug!("Reconciled {}", object.name),
                    Err(kube_runtime::controller::Error::ReconcilerFailed(_, object)) => {
                        // Already logged by error_policy
                        debug!("Reconcile of {} failed and was requeued", object.name);
                    }
                    Err(e) => warn!("Controller error for Node: {}", e),
                }
            })
            .await;

        ready.abort();
        self.readiness.set_not_ready();
        info!("Node watcher stopped");
        Ok(())
    }
}
