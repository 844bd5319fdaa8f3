//! Demand Scheduler CRD Definitions
//!
//! Kubernetes Custom Resource Definitions shared by the demand scheduler
//! control-plane components.

pub mod demand;

pub use demand::*;
