//! Replica-based health of StatefulSets and Deployments

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use serde::{Deserialize, Serialize};

/// Desired vs. ready replicas of a replicated workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaStatus {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub desired: i32,
    pub ready: i32,
}

/// Health derived from a [`ReplicaStatus`]; `Unknown` means the workload was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHealth {
    Healthy,
    Unhealthy,
    Unknown,
}

impl ReplicaStatus {
    pub fn new(name: &str, desired: i32, ready: i32) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeMap::new(),
            desired,
            ready,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn health(&self) -> ComponentHealth {
        if self.desired > 0 && self.ready == self.desired {
            ComponentHealth::Healthy
        } else {
            ComponentHealth::Unhealthy
        }
    }

    /// Health of an optional lookup; absence is `Unknown`
    pub fn health_of(status: Option<&ReplicaStatus>) -> ComponentHealth {
        status.map_or(ComponentHealth::Unknown, ReplicaStatus::health)
    }
}

// The API server defaults `spec.replicas` to 1 when it is omitted.
const DEFAULT_REPLICAS: i32 = 1;

impl From<&StatefulSet> for ReplicaStatus {
    fn from(sts: &StatefulSet) -> Self {
        Self {
            name: sts.metadata.name.clone().unwrap_or_default(),
            labels: sts.metadata.labels.clone().unwrap_or_default(),
            desired: sts
                .spec
                .as_ref()
                .and_then(|s| s.replicas)
                .unwrap_or(DEFAULT_REPLICAS),
            ready: sts
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0),
        }
    }
}

impl From<&Deployment> for ReplicaStatus {
    fn from(deployment: &Deployment) -> Self {
        Self {
            name: deployment.metadata.name.clone().unwrap_or_default(),
            labels: deployment.metadata.labels.clone().unwrap_or_default(),
            desired: deployment
                .spec
                .as_ref()
                .and_then(|s| s.replicas)
                .unwrap_or(DEFAULT_REPLICAS),
            ready: deployment
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0),
        }
    }
}
