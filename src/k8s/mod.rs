//! Kubernetes integration for the smoke test
//!
//! This module is the cluster query facade:
//! - `ClusterApi`, the read-only capability interface the checks consume
//! - `KubeCluster`, its kube-rs implementation
//! - well-known custom resource types and object readers

mod api;
mod client;
pub mod resources;

pub use api::ClusterApi;
#[cfg(test)]
pub use api::MockClusterApi;
pub use client::KubeCluster;
