//! Controller configuration.
//!
//! All settings come from environment variables read once at startup. Every
//! variable is optional; unset variables fall back to the defaults below and
//! malformed values fail startup.

use crate::error::ControllerError;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_METRICS_BIND_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_HEALTH_PROBE_BIND_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8081);
const DEFAULT_CONCURRENCY: u16 = 3;
const DEFAULT_DEBOUNCE_SECONDS: u64 = 5;
const DEFAULT_REQUEUE_AFTER_SECONDS: u64 = 1;
const DEFAULT_ERROR_REQUEUE_SECONDS: u64 = 60;

/// Runtime settings for the OS labeler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Listener for `GET /metrics`
    pub metrics_bind_address: SocketAddr,
    /// Listener for `GET /healthz` and `GET /readyz`
    pub health_probe_bind_address: SocketAddr,
    /// Maximum number of nodes reconciled in parallel
    pub concurrency: u16,
    /// Quiet period between a node event and its reconcile
    pub debounce: Duration,
    /// Delay before retrying after a conflict or a node deleted mid-update
    pub requeue_after: Duration,
    /// Delay before retrying after a failed reconcile
    pub error_requeue_after: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_bind_address: DEFAULT_METRICS_BIND_ADDRESS,
            health_probe_bind_address: DEFAULT_HEALTH_PROBE_BIND_ADDRESS,
            concurrency: DEFAULT_CONCURRENCY,
            debounce: Duration::from_secs(DEFAULT_DEBOUNCE_SECONDS),
            requeue_after: Duration::from_secs(DEFAULT_REQUEUE_AFTER_SECONDS),
            error_requeue_after: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECONDS),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            metrics_bind_address: parse_or(
                &lookup,
                "METRICS_BIND_ADDRESS",
                DEFAULT_METRICS_BIND_ADDRESS,
            )?,
            health_probe_bind_address: parse_or(
                &lookup,
                "HEALTH_PROBE_BIND_ADDRESS",
                DEFAULT_HEALTH_PROBE_BIND_ADDRESS,
            )?,
            concurrency: parse_or(&lookup, "RECONCILE_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            debounce: Duration::from_secs(parse_or(
                &lookup,
                "RECONCILE_DEBOUNCE_SECONDS",
                DEFAULT_DEBOUNCE_SECONDS,
            )?),
            requeue_after: Duration::from_secs(parse_or(
                &lookup,
                "REQUEUE_AFTER_SECONDS",
                DEFAULT_REQUEUE_AFTER_SECONDS,
            )?),
            error_requeue_after: Duration::from_secs(parse_or(
                &lookup,
                "ERROR_REQUEUE_SECONDS",
                DEFAULT_ERROR_REQUEUE_SECONDS,
            )?),
        };

        if config.concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if config.metrics_bind_address == config.health_probe_bind_address {
            return Err(ControllerError::InvalidConfig(format!(
                "METRICS_BIND_ADDRESS and HEALTH_PROBE_BIND_ADDRESS are both {}",
                config.metrics_bind_address
            )));
        }

        Ok(config)
    }
}

/// Parse `key` if it is set, otherwise take `default`.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|e| {
        ControllerError::InvalidConfig(format!("{key}={raw:?} is not valid: {e}"))
    })
}
