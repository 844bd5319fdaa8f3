//! Demand client errors

use thiserror::Error;

/// Errors that can occur when interacting with the cluster API
#[derive(Debug, Error)]
pub enum DemandError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Cluster API returned an unexpected response
    #[error("API error: {0}")]
    Api(String),

    /// No demand exists under the given identity
    #[error("Demand not found: {0}")]
    NotFound(String),

    /// The informer sync wait was requested before the informer was started
    #[error("demand informer has not been started")]
    InformerNotStarted,

    /// The informer event pump stopped
    #[error("demand informer stopped")]
    InformerStopped,
}
