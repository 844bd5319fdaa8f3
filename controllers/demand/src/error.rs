//! Controller-specific error types.
//!
//! This module defines error types specific to the Demand Controller
//! that are not covered by upstream library errors.

use demand_client::DemandError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Demand Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Demand client error
    #[error("Demand client error: {0}")]
    Demand(#[from] DemandError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
