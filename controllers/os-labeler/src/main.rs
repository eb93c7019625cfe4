//! OS Labeler
//!
//! Watches every Node in the cluster and labels it with the operating system
//! it reports, e.g. a node whose `status.nodeInfo.osImage` is
//! `"Ubuntu 22.04.1 LTS"` gets `k8c.io/uses-ubuntu22.04.1lts=true`.

mod config;
mod controller;
mod error;
mod labels;
mod metrics;
mod probes;
mod reconciler;
#[cfg(test)]
mod reconciler_test;
mod test_utils;
mod watcher;

use anyhow::Context as _;
use config::ControllerConfig;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting OS Labeler");

    // kube is built with rustls; pin the ring provider before the first TLS handshake
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    let config = ControllerConfig::from_env().context("failed to load configuration")?;

    info!("Configuration:");
    info!("  Metrics address: {}", config.metrics_bind_address);
    info!("  Health probe address: {}", config.health_probe_bind_address);
    info!("  Concurrency: {}", config.concurrency);
    info!("  Debounce: {:?}", config.debounce);
    info!("  Requeue after: {:?} (errors: {:?})", config.requeue_after, config.error_requeue_after);

    // Initialize and run controller
    let controller = Controller::new(config)
        .await
        .context("failed to initialize controller")?;
    controller.run().await.context("controller exited with an error")?;

    Ok(())
}
