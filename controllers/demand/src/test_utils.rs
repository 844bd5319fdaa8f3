//! Test utilities for unit testing the demand controller
//!
//! This module provides helpers for creating test data and setting up test
//! scenarios.

use k8s_openapi::api::core::v1::{Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Helper to create a test pod, optionally carrying the scheduler marker and
/// a node assignment.
pub fn create_test_pod(name: &str, namespace: &str, managed: bool, node: Option<&str>) -> Pod {
    let mut labels = BTreeMap::new();
    if managed {
        labels.insert(
            crds::MANAGED_BY_LABEL.to_string(),
            crds::SCHEDULER_NAME.to_string(),
        );
    }
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: if labels.is_empty() { None } else { Some(labels) },
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: node.map(ToString::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}
