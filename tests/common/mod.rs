//! In-memory cluster and probe used by the integration tests
//!
//! `FakeCluster::healthy()` describes a fully provisioned cluster; scenarios
//! remove or break individual pieces of it.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStatus, StatefulSet, StatefulSetSpec, StatefulSetStatus,
};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, ContainerPort, Namespace, Node, NodeCondition, NodeStatus,
    PersistentVolumeClaim, PersistentVolumeClaimStatus, Pod, PodSpec, PodStatus, Service,
    ServiceAccount, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    Ingress, IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressRule, IngressSpec,
    IngressStatus,
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde_json::json;

use druid_smoke::error::{QueryError, QueryResult};
use druid_smoke::k8s::{resources, ClusterApi};
use druid_smoke::models::{Gvr, ResourceQuery};
use druid_smoke::probe::{EndpointProbe, ProbeOutcome};

pub const DRUID_NS: &str = "druid";
pub const DRUID_HOST: &str = "druid.data.example.com";
const COMPONENT_LABEL: &str = "app.kubernetes.io/component";

pub fn meta(namespace: Option<&str>, name: &str, labels: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        labels: (!labels.is_empty()).then(|| {
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }),
        ..Default::default()
    }
}

pub fn running_pod(namespace: &str, name: &str, labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: meta(Some(namespace), name, labels),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "main".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            ..Default::default()
        }),
    }
}

pub fn with_metrics_port(mut pod: Pod) -> Pod {
    if let Some(spec) = pod.spec.as_mut() {
        spec.containers[0].ports = Some(vec![ContainerPort {
            container_port: 9090,
            name: Some("metrics".to_string()),
            ..Default::default()
        }]);
    }
    pod
}

pub fn ready_node(name: &str) -> Node {
    Node {
        metadata: meta(None, name, &[]),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn stateful_set(name: &str, component: &str, desired: i32, ready: i32) -> StatefulSet {
    StatefulSet {
        metadata: meta(Some(DRUID_NS), name, &[(COMPONENT_LABEL, component)]),
        spec: Some(StatefulSetSpec {
            replicas: Some(desired),
            ..Default::default()
        }),
        status: Some(StatefulSetStatus {
            ready_replicas: Some(ready),
            replicas: desired,
            ..Default::default()
        }),
    }
}

pub fn deployment(name: &str, component: &str, desired: i32, ready: i32) -> Deployment {
    Deployment {
        metadata: meta(Some(DRUID_NS), name, &[(COMPONENT_LABEL, component)]),
        spec: Some(DeploymentSpec {
            replicas: Some(desired),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            ready_replicas: Some(ready),
            ..Default::default()
        }),
    }
}

pub fn service(namespace: &str, name: &str, headless: bool) -> Service {
    Service {
        metadata: meta(Some(namespace), name, &[]),
        spec: Some(ServiceSpec {
            cluster_ip: Some(if headless { "None" } else { "10.100.0.10" }.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn ingress(namespace: &str, name: &str, host: &str) -> Ingress {
    Ingress {
        metadata: meta(Some(namespace), name, &[]),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                http: None,
            }]),
            ..Default::default()
        }),
        status: Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(vec![IngressLoadBalancerIngress {
                    hostname: Some("k8s-druid-1234.elb.amazonaws.com".to_string()),
                    ..Default::default()
                }]),
            }),
        }),
    }
}

pub fn bound_pvc(name: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: meta(Some(DRUID_NS), name, &[]),
        status: Some(PersistentVolumeClaimStatus {
            phase: Some("Bound".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn config_map(name: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: meta(Some(DRUID_NS), name, &[]),
        data: (!data.is_empty()).then(|| {
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        }),
        ..Default::default()
    }
}

pub fn service_account(namespace: &str, name: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: meta(Some(namespace), name, &[]),
        ..Default::default()
    }
}

pub fn custom(gvr: &Gvr, namespace: Option<&str>, name: &str, ready: bool) -> DynamicObject {
    let mut object = json!({
        "apiVersion": gvr.api_version(),
        "kind": gvr.kind,
        "metadata": {"name": name},
        "status": {"conditions": [{"type": "Ready", "status": if ready { "True" } else { "False" }}]}
    });
    if let Some(ns) = namespace {
        object["metadata"]["namespace"] = json!(ns);
    }
    serde_json::from_value(object).expect("valid custom object")
}

fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: meta(None, name, &[]),
        ..Default::default()
    }
}

/// Cluster state served from memory
#[derive(Default)]
pub struct FakeCluster {
    pub version: Option<String>,
    pub namespaces: Vec<String>,
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub secrets: Vec<ObjectMeta>,
    pub config_maps: Vec<ConfigMap>,
    pub service_accounts: Vec<ServiceAccount>,
    pub claims: Vec<PersistentVolumeClaim>,
    pub stateful_sets: Vec<StatefulSet>,
    pub deployments: Vec<Deployment>,
    pub ingresses: Vec<Ingress>,
    pub crds: HashSet<String>,
    pub api_groups: HashSet<String>,
    /// Installed custom resource types and their objects
    pub custom: HashMap<Gvr, Vec<DynamicObject>>,
    /// Label selectors whose pod listing fails with a transport error
    pub failing_selectors: HashSet<String>,
}

impl FakeCluster {
    pub fn healthy() -> Self {
        let mut cluster = FakeCluster {
            version: Some("v1.31.2-eks-7f9249a".to_string()),
            namespaces: [
                "default",
                "kube-system",
                "cert-manager",
                "external-secrets",
                "kyverno",
                "monitoring",
                DRUID_NS,
            ]
            .map(str::to_string)
            .to_vec(),
            nodes: vec![ready_node("ip-10-0-1-10"), ready_node("ip-10-0-2-11")],
            ..Default::default()
        };

        cluster.pods = vec![
            running_pod("kube-system", "coredns-1", &[("k8s-app", "kube-dns")]),
            running_pod("kube-system", "kube-proxy-1", &[("k8s-app", "kube-proxy")]),
            running_pod("kube-system", "aws-node-1", &[("k8s-app", "aws-node")]),
            running_pod("kube-system", "karpenter-1", &[("app.kubernetes.io/name", "karpenter")]),
            running_pod(
                "kube-system",
                "metrics-server-1",
                &[("app.kubernetes.io/name", "metrics-server")],
            ),
            running_pod("cert-manager", "cert-manager-1", &[("app.kubernetes.io/name", "cert-manager")]),
            running_pod(
                "external-secrets",
                "external-secrets-1",
                &[("app.kubernetes.io/name", "external-secrets")],
            ),
            running_pod(
                "kyverno",
                "kyverno-admission-1",
                &[(COMPONENT_LABEL, "admission-controller")],
            ),
            running_pod(
                "aws-load-balancer",
                "aws-load-balancer-controller-1",
                &[("app.kubernetes.io/name", "aws-load-balancer-controller")],
            ),
            running_pod("external-dns", "external-dns-1", &[("app.kubernetes.io/name", "external-dns")]),
            running_pod("reloader", "reloader-1", &[("app.kubernetes.io/name", "reloader")]),
            running_pod(
                "amazon-cloudwatch",
                "cloudwatch-agent-1",
                &[("app.kubernetes.io/name", "cloudwatch-agent")],
            ),
            running_pod("monitoring", "alloy-logs-1", &[("app.kubernetes.io/name", "alloy-logs")]),
            running_pod(
                "monitoring",
                "alloy-metrics-1",
                &[("app.kubernetes.io/name", "alloy-metrics")],
            ),
            running_pod(
                "monitoring",
                "alloy-singleton-1",
                &[("app.kubernetes.io/name", "alloy-singleton")],
            ),
            running_pod(
                "monitoring",
                "kube-state-metrics-1",
                &[("app.kubernetes.io/name", "kube-state-metrics")],
            ),
            running_pod(
                "monitoring",
                "node-exporter-1",
                &[("app.kubernetes.io/name", "node-exporter")],
            ),
            with_metrics_port(running_pod(
                DRUID_NS,
                "druid-middlemanager-0",
                &[(COMPONENT_LABEL, "middlemanager")],
            )),
            running_pod(DRUID_NS, "druid-broker-6d9f-abcde", &[(COMPONENT_LABEL, "broker")]),
        ];

        cluster.stateful_sets = vec![
            stateful_set("druid-coordinator", "coordinator", 1, 1),
            stateful_set("druid-overlord", "overlord", 1, 1),
            stateful_set("druid-historical", "historical", 2, 2),
        ];
        cluster.deployments = vec![
            deployment("druid-broker", "broker", 2, 2),
            deployment("druid-router", "router", 1, 1),
        ];

        cluster.services = ["broker", "coordinator", "router", "overlord", "historical"]
            .iter()
            .map(|component| service(DRUID_NS, &format!("druid-{component}"), false))
            .chain([service(DRUID_NS, "druid-historical-headless", true)])
            .collect();

        cluster.ingresses = vec![
            ingress(DRUID_NS, "druid-router", DRUID_HOST),
            ingress("monitoring", "grafana", "grafana.data.example.com"),
        ];

        cluster.secrets = vec![
            meta(Some(DRUID_NS), "druid-admin-password", &[]),
            meta(Some(DRUID_NS), "druid-rds-credentials", &[]),
        ];

        cluster.config_maps = vec![
            config_map(
                "druid-common-conf",
                &[(
                    "common.runtime.properties",
                    "druid.discovery.type=k8s\n\
                     druid.zk.service.enabled=false\n\
                     druid.discovery.k8s.clusterIdentifier=druid-prod\n",
                )],
            ),
            config_map("druid-broker-conf", &[]),
            config_map("druid-leaderelection-coordinator", &[]),
        ];

        cluster.service_accounts = vec![
            service_account(DRUID_NS, "default"),
            service_account(DRUID_NS, "druid"),
            service_account("ingestion", "msk-producer"),
        ];

        cluster.claims = vec![
            bound_pvc("data-druid-historical-0"),
            bound_pvc("data-druid-historical-1"),
        ];

        cluster.crds = [
            "externalsecrets.external-secrets.io",
            "clustersecretstores.external-secrets.io",
            "certificates.cert-manager.io",
            "clusterissuers.cert-manager.io",
            "clusterpolicies.kyverno.io",
            "nodepools.karpenter.sh",
            "ec2nodeclasses.karpenter.k8s.aws",
        ]
        .map(str::to_string)
        .into_iter()
        .collect();

        cluster.api_groups = [resources::METRICS_API.to_string()].into_iter().collect();

        cluster.custom = [
            (
                resources::NODE_POOLS,
                vec![
                    custom(&resources::NODE_POOLS, None, "default", true),
                    custom(&resources::NODE_POOLS, None, "druid-historical", true),
                ],
            ),
            (
                resources::CLUSTER_SECRET_STORES,
                vec![custom(
                    &resources::CLUSTER_SECRET_STORES,
                    None,
                    "aws-secrets-manager",
                    true,
                )],
            ),
            (
                resources::EXTERNAL_SECRETS,
                vec![
                    custom(&resources::EXTERNAL_SECRETS, Some(DRUID_NS), "druid-admin", true),
                    custom(
                        &resources::EXTERNAL_SECRETS,
                        Some(DRUID_NS),
                        "druid-metadata-store",
                        true,
                    ),
                ],
            ),
            (
                resources::CLUSTER_POLICIES,
                vec![custom(&resources::CLUSTER_POLICIES, None, "require-labels", true)],
            ),
            (
                resources::SERVICE_MONITORS,
                vec![custom(&resources::SERVICE_MONITORS, Some(DRUID_NS), "druid", true)],
            ),
        ]
        .into_iter()
        .collect();

        cluster
    }

    pub fn without_workload_namespace(mut self) -> Self {
        self.namespaces.retain(|ns| ns != DRUID_NS);
        self
    }
}

fn selector_matches(meta: &ObjectMeta, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    selector.split(',').all(|term| {
        let Some((key, value)) = term.split_once('=') else {
            return false;
        };
        meta.labels
            .as_ref()
            .and_then(|labels| labels.get(key.trim()))
            .is_some_and(|v| v == value.trim())
    })
}

fn in_scope(meta: &ObjectMeta, query: &ResourceQuery) -> bool {
    let namespace_ok = match &query.namespace {
        Some(ns) => meta.namespace.as_deref() == Some(ns.as_str()),
        None => true,
    };
    namespace_ok && selector_matches(meta, query.label_selector.as_deref())
}

fn select<T: Clone>(
    items: &[T],
    query: &ResourceQuery,
    meta: impl Fn(&T) -> &ObjectMeta,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| in_scope(meta(item), query))
        .cloned()
        .collect()
}

fn transport_error(what: &str) -> QueryError {
    QueryError::Decode(format!("connection reset while listing {what}"))
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn server_version(&self) -> QueryResult<String> {
        self.version
            .clone()
            .ok_or_else(|| transport_error("version"))
    }

    async fn api_resources(&self, group_version: &str) -> QueryResult<Vec<String>> {
        if self.api_groups.contains(group_version) {
            Ok(vec!["nodes".to_string(), "pods".to_string()])
        } else {
            Err(QueryError::not_found("APIGroup", group_version))
        }
    }

    async fn get_namespace(&self, name: &str) -> QueryResult<Option<Namespace>> {
        Ok(self
            .namespaces
            .iter()
            .find(|ns| ns.as_str() == name)
            .map(|ns| namespace(ns)))
    }

    async fn list_namespaces(&self) -> QueryResult<Vec<Namespace>> {
        Ok(self.namespaces.iter().map(|ns| namespace(ns)).collect())
    }

    async fn list_nodes(&self) -> QueryResult<Vec<Node>> {
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self, query: &ResourceQuery) -> QueryResult<Vec<Pod>> {
        if let Some(selector) = &query.label_selector {
            if self.failing_selectors.contains(selector) {
                return Err(transport_error("pods"));
            }
        }
        Ok(select(&self.pods, query, |p| &p.metadata))
    }

    async fn list_services(&self, query: &ResourceQuery) -> QueryResult<Vec<Service>> {
        Ok(select(&self.services, query, |s| &s.metadata))
    }

    async fn list_secrets(&self, query: &ResourceQuery) -> QueryResult<Vec<ObjectMeta>> {
        Ok(select(&self.secrets, query, |m| m))
    }

    async fn list_config_maps(&self, query: &ResourceQuery) -> QueryResult<Vec<ConfigMap>> {
        Ok(select(&self.config_maps, query, |c| &c.metadata))
    }

    async fn list_service_accounts(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<ServiceAccount>> {
        Ok(select(&self.service_accounts, query, |s| &s.metadata))
    }

    async fn list_persistent_volume_claims(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<PersistentVolumeClaim>> {
        Ok(select(&self.claims, query, |c| &c.metadata))
    }

    async fn list_stateful_sets(&self, query: &ResourceQuery) -> QueryResult<Vec<StatefulSet>> {
        Ok(select(&self.stateful_sets, query, |s| &s.metadata))
    }

    async fn list_deployments(&self, query: &ResourceQuery) -> QueryResult<Vec<Deployment>> {
        Ok(select(&self.deployments, query, |d| &d.metadata))
    }

    async fn list_ingresses(&self, query: &ResourceQuery) -> QueryResult<Vec<Ingress>> {
        Ok(select(&self.ingresses, query, |i| &i.metadata))
    }

    async fn get_crd(&self, name: &str) -> QueryResult<Option<CustomResourceDefinition>> {
        Ok(self.crds.contains(name).then(|| CustomResourceDefinition {
            metadata: meta(None, name, &[]),
            ..Default::default()
        }))
    }

    async fn list_custom(
        &self,
        gvr: &Gvr,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<DynamicObject>> {
        match self.custom.get(gvr) {
            Some(objects) => Ok(select(objects, query, |o| &o.metadata)),
            None => Err(QueryError::not_found(gvr.kind, gvr.to_string())),
        }
    }

    async fn get_custom(
        &self,
        gvr: &Gvr,
        query: &ResourceQuery,
        name: &str,
    ) -> QueryResult<Option<DynamicObject>> {
        Ok(self.custom.get(gvr).and_then(|objects| {
            objects
                .iter()
                .filter(|o| in_scope(&o.metadata, query))
                .find(|o| o.metadata.name.as_deref() == Some(name))
                .cloned()
        }))
    }
}

/// Probe answering every URL with one fixed outcome and recording the calls
pub struct FakeProbe {
    outcome: ProbeOutcome,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn answering(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Self {
        Self::answering(ProbeOutcome::Status(200))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("probe call log").clone()
    }
}

#[async_trait]
impl EndpointProbe for FakeProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.lock().expect("probe call log").push(url.to_string());
        self.outcome.clone()
    }
}
