//! Well-known resource types and small readers over Kubernetes objects

use k8s_openapi::api::core::v1::{Node, PersistentVolumeClaim, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::DynamicObject;

use crate::models::Gvr;

pub const NODE_POOLS: Gvr = Gvr::new("karpenter.sh", "v1", "NodePool", "nodepools");
pub const CLUSTER_SECRET_STORES: Gvr = Gvr::new(
    "external-secrets.io",
    "v1",
    "ClusterSecretStore",
    "clustersecretstores",
);
pub const EXTERNAL_SECRETS: Gvr =
    Gvr::new("external-secrets.io", "v1", "ExternalSecret", "externalsecrets");
pub const CLUSTER_POLICIES: Gvr = Gvr::new("kyverno.io", "v1", "ClusterPolicy", "clusterpolicies");
pub const SERVICE_MONITORS: Gvr = Gvr::new(
    "monitoring.coreos.com",
    "v1",
    "ServiceMonitor",
    "servicemonitors",
);

/// Group/version served by metrics-server
pub const METRICS_API: &str = "metrics.k8s.io/v1beta1";

/// Container ports that indicate a scrapeable metrics endpoint
pub const METRICS_PORTS: [i32; 2] = [8000, 9090];

pub fn pod_is_running(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .is_some_and(|phase| phase == "Running")
}

pub fn count_running(pods: &[Pod]) -> usize {
    pods.iter().filter(|pod| pod_is_running(pod)).count()
}

/// Value of the node's Ready condition, if it reports one
pub fn node_ready(node: &Node) -> Option<bool> {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map(|c| c.status == "True")
}

/// True when `status.conditions` contains `{type: Ready, status: "True"}`
pub fn has_ready_condition(obj: &DynamicObject) -> bool {
    obj.data
        .get("status")
        .and_then(|s| s.get("conditions"))
        .and_then(|c| c.as_array())
        .is_some_and(|conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(|t| t.as_str()) == Some("Ready")
                    && c.get("status").and_then(|s| s.as_str()) == Some("True")
            })
        })
}

pub fn ingress_has_load_balancer(ingress: &Ingress) -> bool {
    ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .is_some_and(|entries| !entries.is_empty())
}

/// Host of the first rule, when set
pub fn first_rule_host(ingress: &Ingress) -> Option<&str> {
    ingress
        .spec
        .as_ref()
        .and_then(|s| s.rules.as_ref())
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.host.as_deref())
        .filter(|host| !host.is_empty())
}

pub fn is_headless(service: &Service) -> bool {
    service
        .spec
        .as_ref()
        .and_then(|s| s.cluster_ip.as_deref())
        == Some("None")
}

pub fn pvc_is_bound(pvc: &PersistentVolumeClaim) -> bool {
    pvc.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        == Some("Bound")
}

/// Any container exposes a port named `metrics` or one of [`METRICS_PORTS`]
pub fn exposes_metrics_port(pod: &Pod) -> bool {
    pod.spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .flat_map(|container| container.ports.iter().flatten())
        .any(|port| {
            port.name.as_deref() == Some("metrics") || METRICS_PORTS.contains(&port.container_port)
        })
}
