//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the lazy demand
//! CRD watcher and the demand reclaimer and runs them as background tasks.

use crate::error::ControllerError;
use crate::reclaimer::DemandReclaimer;
use crate::watcher::{DemandWatcher, WatcherConfig};
use demand_client::DemandClient;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main controller for the demand control plane.
pub struct Controller {
    demands: Arc<DemandWatcher<DemandClient>>,
    demand_watcher: JoinHandle<Result<(), ControllerError>>,
    pod_watcher: JoinHandle<Result<(), ControllerError>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        namespace: Option<String>,
        config: WatcherConfig,
    ) -> Result<Self, ControllerError> {
        info!("Initializing Demand Controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await.map_err(ControllerError::Kube)?;

        let demand_client = Arc::new(DemandClient::new(kube_client.clone(), namespace.clone()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Lazy demand watcher: completes once the CRD is present and synced
        let demands = Arc::new(DemandWatcher::new(demand_client.clone(), config));
        let demand_watcher = {
            let watcher = demands.clone();
            let shutdown = shutdown_rx.clone();
            tokio::spawn(async move { watcher.start(shutdown).await })
        };

        // Pod watcher: reclaims demands for pods that become scheduled
        let pod_api: Api<Pod> = match namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client, ns),
            None => Api::all(kube_client),
        };
        let reclaimer = DemandReclaimer::new(demand_client);
        let pod_watcher = tokio::spawn(async move { reclaimer.run(pod_api, shutdown_rx).await });

        Ok(Self {
            demands,
            demand_watcher,
            pod_watcher,
            shutdown_tx,
        })
    }

    /// The lazy demand watcher, for consumers that need the demand store
    /// once it becomes available.
    pub fn demands(&self) -> Arc<DemandWatcher<DemandClient>> {
        self.demands.clone()
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Demand Controller running");

        let Self {
            demand_watcher,
            mut pod_watcher,
            shutdown_tx,
            ..
        } = self;

        // The demand watcher finishing is normal: it means the CRD became
        // ready. Only the pod watcher exiting ends the process.
        tokio::spawn(async move {
            match demand_watcher.await {
                Ok(Ok(())) => info!("demand CRD watcher finished"),
                Ok(Err(e)) => error!("demand CRD watcher error: {e}"),
                Err(e) => error!("demand CRD watcher panicked: {e}"),
            }
        });

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            result = &mut pod_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Pod watcher panicked: {e}")))??;
            }
        }

        Ok(())
    }
}
