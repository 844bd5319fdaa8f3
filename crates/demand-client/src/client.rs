//! Concrete cluster API client for Demand resources.
//!
//! Wraps a `kube::Client` with the three operations the control-plane
//! components need: CRD discovery, a reflector-backed demand cache, and
//! demand deletion.

use crate::demand_trait::DemandClientTrait;
use crate::error::DemandError;
use crds::{Demand, demand_crd_name};
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::DeleteParams;
use kube::{Api, Client};
use kube_runtime::reflector::Store;
use kube_runtime::{WatchStreamExt, reflector, watcher};
use std::sync::Mutex;
use tracing::{info, warn};

/// Cluster API client for Demand resources.
pub struct DemandClient {
    client: Client,
    namespace: Option<String>,
    store: Mutex<Option<Store<Demand>>>,
}

impl DemandClient {
    /// Creates a new client.
    ///
    /// `namespace` limits the demand watch and deletes to one namespace;
    /// `None` covers the whole cluster.
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self {
            client,
            namespace,
            store: Mutex::new(None),
        }
    }

    fn demand_api(&self) -> Api<Demand> {
        match self.namespace.as_deref() {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

/// An established CRD has been accepted by the API server and serves its
/// resource endpoints; a CRD object that merely exists may still be
/// mid-registration.
fn crd_is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
}

#[async_trait::async_trait]
impl DemandClientTrait for DemandClient {
    async fn crd_established(&self) -> Result<bool, DemandError> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        match api.get_opt(&demand_crd_name()).await? {
            Some(crd) => Ok(crd_is_established(&crd)),
            None => Ok(false),
        }
    }

    fn start_informer(&self) -> Store<Demand> {
        let mut guard = self.store.lock().expect("informer lock poisoned");
        if let Some(store) = guard.as_ref() {
            return store.clone();
        }

        let (reader, writer) = reflector::store::<Demand>();
        let stream = watcher(self.demand_api(), watcher::Config::default()).default_backoff();
        let pump = reflector::reflector(writer, stream);
        tokio::spawn(async move {
            futures::pin_mut!(pump);
            while let Some(event) = pump.next().await {
                if let Err(err) = event {
                    warn!(error = %err, "demand watch stream error, backing off");
                }
            }
            info!("demand watch stream closed");
        });

        *guard = Some(reader.clone());
        reader
    }

    async fn wait_synced(&self) -> Result<(), DemandError> {
        let store = self
            .store
            .lock()
            .expect("informer lock poisoned")
            .as_ref()
            .cloned();
        match store {
            Some(store) => store
                .wait_until_ready()
                .await
                .map_err(|_| DemandError::InformerStopped),
            None => Err(DemandError::InformerNotStarted),
        }
    }

    async fn delete_demand(&self, namespace: &str, name: &str) -> Result<(), DemandError> {
        let api: Api<Demand> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                Err(DemandError::NotFound(format!("{namespace}/{name}")))
            }
            Err(err) => Err(DemandError::Kube(err)),
        }
    }
}
