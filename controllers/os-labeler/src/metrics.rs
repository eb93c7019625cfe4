//! Prometheus metrics for the reconcile loop.

use crate::error::ControllerError;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::fmt;
use std::time::Duration;

/// Outcome label recorded for reconciles that returned an error.
pub const ERROR_OUTCOME: &str = "error";

/// Metrics exported on `/metrics`.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconcile_total: IntCounterVec,
    reconcile_duration: Histogram,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Build the metric set on a private registry.
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new_custom(Some("os_labeler".to_string()), None)?;

        let reconcile_total = IntCounterVec::new(
            Opts::new("reconcile_total", "Node reconciles by outcome"),
            &["outcome"],
        )?;
        let reconcile_duration = Histogram::with_opts(
            HistogramOpts::new("reconcile_duration_seconds", "Time spent reconciling one node")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(reconcile_total.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self { registry, reconcile_total, reconcile_duration })
    }

    /// Record one finished reconcile.
    pub fn observe(&self, outcome: &str, elapsed: Duration) {
        self.reconcile_total.with_label_values(&[outcome]).inc();
        self.reconcile_duration.observe(elapsed.as_secs_f64());
    }

    /// Count of reconciles recorded with `outcome`.
    #[cfg(test)]
    pub fn reconcile_count(&self, outcome: &str) -> u64 {
        self.reconcile_total.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, ControllerError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics output is not UTF-8: {e}")).into())
    }
}
