//! Demand Controller
//!
//! Control-plane companion of the batch scheduler:
//! - Lazily watches for the optional Demand CRD and exposes a synced demand
//!   cache once the CRD is established
//! - Reclaims stale Demand resources once the pod they were created for has
//!   been scheduled

mod backoff;
mod controller;
mod error;
mod reclaimer;
mod watcher;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod reclaimer_test;

use crate::error::ControllerError;
use controller::Controller;
use std::env;
use std::time::Duration;
use tracing::info;
use watcher::WatcherConfig;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting Demand Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").ok();
    let mut config = WatcherConfig::default();
    if let Ok(value) = env::var("DEMAND_CRD_POLL_INTERVAL_SECS") {
        let secs: u64 = value.parse().map_err(|_| {
            ControllerError::InvalidConfig(
                "DEMAND_CRD_POLL_INTERVAL_SECS must be an integer number of seconds".to_string(),
            )
        })?;
        config.poll_interval = Duration::from_secs(secs);
    }

    info!("Configuration:");
    info!(
        "  Namespace: {}",
        namespace.as_deref().unwrap_or("all namespaces")
    );
    info!("  CRD poll interval: {:?}", config.poll_interval);

    // Initialize and run controller
    let controller = Controller::new(namespace, config).await?;
    controller.run().await?;

    Ok(())
}
