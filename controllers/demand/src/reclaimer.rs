//! Stale demand reclamation.
//!
//! The scheduling path deletes a pod's demand when it places the pod, but a
//! demand created while the pod was concurrently being scheduled can slip
//! past that delete. This module watches pod updates and deletes the demand
//! for any managed pod that transitions to scheduled, as a backstop.

use crate::error::ControllerError;
use crds::{MANAGED_BY_LABEL, SCHEDULER_NAME, demand_name_for_pod};
use demand_client::{DemandClientTrait, delete_demand_if_exists};
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, ResourceExt};
use kube_runtime::watcher;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Tag identifying this component in demand deletion logs.
const SOURCE_TAG: &str = "demand-reclaimer";

/// A pod belongs to this scheduling system if the scheduler marked it.
pub(crate) fn is_managed_pod(pod: &Pod) -> bool {
    pod.labels().get(MANAGED_BY_LABEL).map(String::as_str) == Some(SCHEDULER_NAME)
}

/// True when the node assignment is present on `new` but was not on `old`.
pub(crate) fn newly_scheduled(old: &Pod, new: &Pod) -> bool {
    !has_node_assignment(old) && has_node_assignment(new)
}

fn has_node_assignment(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.node_name.as_deref())
        .is_some_and(|node| !node.is_empty())
}

fn pod_key(pod: &Pod) -> String {
    format!("{}/{}", pod.namespace().unwrap_or_default(), pod.name_any())
}

/// Deletes the demand for a pod once the pod has been scheduled.
///
/// Holds no state of its own; the update handler is stateless and safe to
/// invoke concurrently for distinct pods. Deletion races against the
/// scheduling path deleting the same demand; both sides rely on the delete
/// being idempotent rather than on any coordination.
pub struct DemandReclaimer<C> {
    client: Arc<C>,
}

impl<C: DemandClientTrait> DemandReclaimer<C> {
    /// Creates a new reclaimer over the given client.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Handles one pod update pair.
    ///
    /// Fires at most one demand deletion, keyed by the pod's identity, and
    /// only for managed pods whose node assignment is newly present.
    /// Deletion failures are logged, not propagated; the next transition of
    /// another pod is unaffected.
    pub(crate) async fn on_pod_update(&self, old: &Pod, new: &Pod) {
        if !is_managed_pod(new) || !newly_scheduled(old, new) {
            return;
        }
        let namespace = new.namespace().unwrap_or_default();
        let demand = demand_name_for_pod(&new.name_any());
        debug!(pod = %new.name_any(), %namespace, "pod scheduled, reclaiming demand");
        if let Err(err) =
            delete_demand_if_exists(self.client.as_ref(), &namespace, &demand, SOURCE_TAG).await
        {
            warn!(error = %err, %namespace, name = %demand, "failed to delete demand for scheduled pod");
        }
    }

    /// Watches pods and reclaims demands for those that become scheduled.
    ///
    /// The watch stream only carries current object versions, so consecutive
    /// versions of each managed pod are paired here to recover the
    /// `(old, new)` transition the handler needs. A relist replays current
    /// state: replayed pods are diffed against their last-seen version so a
    /// transition that happened while disconnected is still observed, and
    /// entries missing from the replay are pruned.
    pub async fn run(
        &self,
        pods: Api<Pod>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ControllerError> {
        info!("Starting pod watcher");

        let selector = format!("{MANAGED_BY_LABEL}={SCHEDULER_NAME}");
        let stream = watcher(pods, watcher::Config::default().labels(&selector));
        futures::pin_mut!(stream);

        let mut last_seen: HashMap<String, Pod> = HashMap::new();
        let mut replayed: HashSet<String> = HashSet::new();
        loop {
            let event = tokio::select! {
                _ = shutdown.changed() => {
                    info!("pod watcher stopping");
                    return Ok(());
                }
                event = stream.try_next() => event
                    .map_err(|e| ControllerError::Watch(format!("Pod watcher stream error: {e}")))?,
            };
            match event {
                Some(watcher::Event::Apply(pod)) => {
                    if !is_managed_pod(&pod) {
                        continue;
                    }
                    let key = pod_key(&pod);
                    if let Some(old) = last_seen.insert(key, pod.clone()) {
                        self.on_pod_update(&old, &pod).await;
                    }
                }
                Some(watcher::Event::Delete(pod)) => {
                    last_seen.remove(&pod_key(&pod));
                }
                Some(watcher::Event::Init) => {
                    replayed.clear();
                }
                Some(watcher::Event::InitApply(pod)) => {
                    if !is_managed_pod(&pod) {
                        continue;
                    }
                    let key = pod_key(&pod);
                    replayed.insert(key.clone());
                    if let Some(old) = last_seen.insert(key, pod.clone()) {
                        self.on_pod_update(&old, &pod).await;
                    }
                }
                Some(watcher::Event::InitDone) => {
                    last_seen.retain(|key, _| replayed.contains(key));
                }
                None => {
                    warn!("pod watcher stream ended");
                    return Ok(());
                }
            }
        }
    }
}
