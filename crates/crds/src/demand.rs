//! Demand CRD
//!
//! Represents a pod's unmet resource requirements. Created by the scheduler
//! when a pod cannot be placed immediately, consumed by the cluster
//! autoscaler, and deleted once the pod is scheduled.

use kube::CustomResource;
use kube::Resource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label the scheduler stamps on every pod it manages.
pub const MANAGED_BY_LABEL: &str = "scaler.microscaler.io/managed-by";

/// Value of [`MANAGED_BY_LABEL`] for pods owned by this scheduling system.
pub const SCHEDULER_NAME: &str = "batch-scheduler";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "scaler.microscaler.io",
    version = "v1alpha1",
    kind = "Demand",
    namespaced,
    status = "DemandStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DemandSpec {
    /// Instance group the demanded capacity should be added to
    pub instance_group: String,

    /// Units of capacity the pod is waiting for
    pub units: Vec<DemandUnit>,

    /// Whether the demand outlives a single scheduling attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_long_lived: Option<bool>,
}

/// A single unit of demanded capacity.
///
/// Quantities are Kubernetes resource quantity strings ("500m", "2Gi") so the
/// schema stays representable; parsing is the consumer's concern.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemandUnit {
    /// Number of identical units requested
    pub count: u32,

    /// CPU per unit
    pub cpu: String,

    /// Memory per unit
    pub memory: String,

    /// GPUs per unit (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvidia_gpus: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DemandStatus {
    /// Fulfillment state
    pub phase: DemandPhase,

    /// Last phase transition timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
/// Demand fulfillment state
///
/// Serializes as PascalCase ("Pending", "Fulfilled", etc.) but deserializes
/// both PascalCase and lowercase ("pending", "fulfilled", etc.) for backward
/// compatibility with existing CRs in the cluster.
#[serde(rename_all = "PascalCase")]
pub enum DemandPhase {
    /// Demand created, capacity not yet provisioned
    #[default]
    #[serde(alias = "pending")] // Backward compatibility: accept lowercase
    Pending,

    /// Capacity provisioned
    #[serde(alias = "fulfilled")] // Backward compatibility: accept lowercase
    Fulfilled,

    /// Capacity can never be provisioned (e.g. exceeds instance group limits)
    #[serde(alias = "unfulfillable")] // Backward compatibility: accept lowercase
    Unfulfillable,
}

/// Fully-qualified name of the Demand CRD object (`demands.<group>`), the key
/// a discovery check looks it up under.
pub fn demand_crd_name() -> String {
    format!("{}.{}", Demand::plural(&()), Demand::group(&()))
}

/// Name of the demand record created for a pod.
///
/// The scheduler creates at most one demand per pod, in the pod's namespace,
/// under this derived name.
pub fn demand_name_for_pod(pod_name: &str) -> String {
    format!("demand-{pod_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_crd_name() {
        assert_eq!(demand_crd_name(), "demands.scaler.microscaler.io");
    }

    #[test]
    fn test_demand_name_for_pod() {
        assert_eq!(demand_name_for_pod("my-driver-0"), "demand-my-driver-0");
    }

    #[test]
    fn test_demand_phase_accepts_lowercase() {
        let phase: DemandPhase = serde_json::from_str("\"fulfilled\"").expect("deserialize");
        assert_eq!(phase, DemandPhase::Fulfilled);
        let phase: DemandPhase = serde_json::from_str("\"Fulfilled\"").expect("deserialize");
        assert_eq!(phase, DemandPhase::Fulfilled);
    }
}
