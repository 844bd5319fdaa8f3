//! Mock DemandClient for unit testing
//!
//! This module provides a mock implementation of DemandClientTrait that can be
//! used in unit tests without requiring a running cluster. The demand cache is
//! backed by a real reflector store so handle semantics match production.

use crate::demand_trait::DemandClientTrait;
use crate::error::DemandError;
use crds::{Demand, DemandSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_runtime::reflector;
use kube_runtime::reflector::Store;
use kube_runtime::reflector::store::Writer;
use kube_runtime::watcher::Event;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

struct MockInformer {
    reader: Store<Demand>,
    writer: Writer<Demand>,
    synced: bool,
}

/// Mock DemandClient for testing
///
/// Scripts the discovery and sync behavior seen by the watcher: how many
/// discovery checks fail or report the CRD absent, and how many sync attempts
/// hang before the cache becomes ready. Counts every call for assertions.
#[derive(Default)]
pub struct MockDemandClient {
    crd_check_errors: usize,
    crd_absent_checks: usize,
    sync_hangs: usize,
    crd_checks: AtomicUsize,
    sync_attempts: AtomicUsize,
    informer: Mutex<Option<MockInformer>>,
    demands: Mutex<HashMap<(String, String), Demand>>,
    delete_calls: Mutex<Vec<(String, String)>>,
}

impl MockDemandClient {
    /// Create a mock whose CRD is established and whose cache syncs on the
    /// first attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `checks` discovery checks return an error.
    #[must_use]
    pub fn with_crd_check_errors(mut self, checks: usize) -> Self {
        self.crd_check_errors = checks;
        self
    }

    /// After any scripted errors, the next `checks` discovery checks report
    /// the CRD as absent.
    #[must_use]
    pub fn with_crd_absent_for(mut self, checks: usize) -> Self {
        self.crd_absent_checks = checks;
        self
    }

    /// The CRD never becomes established.
    #[must_use]
    pub fn crd_never_established(mut self) -> Self {
        self.crd_absent_checks = usize::MAX;
        self
    }

    /// The first `attempts` sync waits hang until they are timed out.
    #[must_use]
    pub fn with_sync_hangs(mut self, attempts: usize) -> Self {
        self.sync_hangs = attempts;
        self
    }

    /// Every sync wait hangs until it is timed out.
    #[must_use]
    pub fn sync_never_completes(mut self) -> Self {
        self.sync_hangs = usize::MAX;
        self
    }

    /// Seed a demand into the mock store (for test setup).
    pub fn add_demand(&self, namespace: &str, name: &str) {
        let demand = Demand {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: DemandSpec {
                instance_group: "default".to_string(),
                units: Vec::new(),
                is_long_lived: None,
            },
            status: None,
        };
        self.demands
            .lock()
            .expect("demands lock poisoned")
            .insert((namespace.to_string(), name.to_string()), demand);
    }

    /// Number of discovery checks made so far.
    pub fn crd_checks(&self) -> usize {
        self.crd_checks.load(Ordering::SeqCst)
    }

    /// Number of sync waits made so far.
    pub fn sync_attempts(&self) -> usize {
        self.sync_attempts.load(Ordering::SeqCst)
    }

    /// Every `(namespace, name)` passed to `delete_demand`, in call order.
    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.delete_calls
            .lock()
            .expect("delete_calls lock poisoned")
            .clone()
    }

    /// Replay the seeded demands into the store and release sync waiters.
    fn mark_synced(&self) {
        let mut guard = self.informer.lock().expect("informer lock poisoned");
        let Some(informer) = guard.as_mut() else {
            return;
        };
        if informer.synced {
            return;
        }
        let demands: Vec<Demand> = self
            .demands
            .lock()
            .expect("demands lock poisoned")
            .values()
            .cloned()
            .collect();
        informer.writer.apply_watcher_event(&Event::Init);
        for demand in demands {
            informer.writer.apply_watcher_event(&Event::InitApply(demand));
        }
        informer.writer.apply_watcher_event(&Event::InitDone);
        informer.synced = true;
    }
}

#[async_trait::async_trait]
impl DemandClientTrait for MockDemandClient {
    async fn crd_established(&self) -> Result<bool, DemandError> {
        let check = self.crd_checks.fetch_add(1, Ordering::SeqCst);
        if check < self.crd_check_errors {
            return Err(DemandError::Api("scripted discovery failure".to_string()));
        }
        Ok(check >= self.crd_check_errors.saturating_add(self.crd_absent_checks))
    }

    fn start_informer(&self) -> Store<Demand> {
        let mut guard = self.informer.lock().expect("informer lock poisoned");
        let informer = guard.get_or_insert_with(|| {
            let (reader, writer) = reflector::store::<Demand>();
            MockInformer {
                reader,
                writer,
                synced: false,
            }
        });
        informer.reader.clone()
    }

    async fn wait_synced(&self) -> Result<(), DemandError> {
        let attempt = self.sync_attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.sync_hangs {
            // Simulates a cache that never finishes its initial list; the
            // caller's timeout is the only way out.
            std::future::pending::<()>().await;
        }
        self.mark_synced();
        Ok(())
    }

    async fn delete_demand(&self, namespace: &str, name: &str) -> Result<(), DemandError> {
        self.delete_calls
            .lock()
            .expect("delete_calls lock poisoned")
            .push((namespace.to_string(), name.to_string()));
        let removed = self
            .demands
            .lock()
            .expect("demands lock poisoned")
            .remove(&(namespace.to_string(), name.to_string()));
        match removed {
            Some(demand) => {
                let mut guard = self.informer.lock().expect("informer lock poisoned");
                if let Some(informer) = guard.as_mut() {
                    if informer.synced {
                        informer.writer.apply_watcher_event(&Event::Delete(demand));
                    }
                }
                Ok(())
            }
            None => Err(DemandError::NotFound(format!("{namespace}/{name}"))),
        }
    }
}
