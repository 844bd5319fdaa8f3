//! DemandClient trait for mocking
//!
//! This trait abstracts the DemandClient to enable mocking in unit tests.
//! The concrete DemandClient implements this trait, and tests can use mock
//! implementations.

use crate::error::DemandError;
use crds::Demand;
use kube_runtime::reflector::Store;
use tracing::{debug, info};

/// Trait for cluster API operations on Demand resources
///
/// This trait enables mocking of cluster API calls for unit testing.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait DemandClientTrait: Send + Sync {
    /// Check whether the Demand CRD is registered and established.
    ///
    /// Transient API failures are expected; callers treat an error the same
    /// as "not yet known" and retry later.
    async fn crd_established(&self) -> Result<bool, DemandError>;

    /// Start the demand informer and return its read handle.
    ///
    /// Idempotent: the event pump is started on the first call, later calls
    /// return the same handle.
    fn start_informer(&self) -> Store<Demand>;

    /// Wait until the demand cache has completed its initial sync.
    ///
    /// Callers bound this with a timeout; the wait itself is unbounded.
    async fn wait_synced(&self) -> Result<(), DemandError>;

    /// Delete the demand with the given identity.
    ///
    /// Returns [`DemandError::NotFound`] if no such demand exists.
    async fn delete_demand(&self, namespace: &str, name: &str) -> Result<(), DemandError>;
}

/// Delete the demand with the given identity, tolerating its absence.
///
/// The demand may already have been deleted by the scheduling path that
/// fulfilled it; the two deleters are not coordinated, so absence counts as
/// success here. `source` identifies the caller in logs.
pub async fn delete_demand_if_exists<C>(
    client: &C,
    namespace: &str,
    name: &str,
    source: &str,
) -> Result<(), DemandError>
where
    C: DemandClientTrait + ?Sized,
{
    match client.delete_demand(namespace, name).await {
        Ok(()) => {
            info!(namespace, name, source, "deleted demand");
            Ok(())
        }
        Err(DemandError::NotFound(_)) => {
            debug!(namespace, name, source, "demand already deleted");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
