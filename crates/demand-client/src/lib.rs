//! Demand Cluster API Client
//!
//! A client library for the control-plane components that manage `Demand`
//! resources. Covers the three cluster API concerns the components consume:
//! CRD discovery, a synchronized demand cache, and idempotent demand deletion.
//!
//! # Example
//!
//! ```no_run
//! use demand_client::{DemandClient, DemandClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kube = kube::Client::try_default().await?;
//! let client = DemandClient::new(kube, None);
//!
//! // Only start watching once the CRD is registered
//! if client.crd_established().await? {
//!     let store = client.start_informer();
//!     client.wait_synced().await?;
//!     println!("tracking {} demands", store.state().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Discovery**: check whether the Demand CRD is registered and established
//! - **Caching**: a reflector-backed read handle over demand instances
//! - **Deletion**: idempotent removal of the demand created for a pod

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod demand_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::DemandClient;
pub use demand_trait::{DemandClientTrait, delete_demand_if_exists};
pub use error::DemandError;
#[cfg(feature = "test-util")]
pub use mock::MockDemandClient;
