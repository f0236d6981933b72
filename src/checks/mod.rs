//! Check evaluators
//!
//! Pure functions from query results to [`CheckResult`]s. They encode the
//! verdict policy shared by every check group:
//!
//! - a query that fails to execute is a `Fail` with an `(error listing)`
//!   qualifier, never a silent `Warning`
//! - absence of a required resource is a `Fail`, absence of an optional one
//!   is a `Warning`
//! - components that may scale to zero only warn when nothing is running
//! - an unreachable external endpoint is always a `Warning`

mod classify;

pub use classify::{Classifier, Purpose, NAME_HEURISTICS};

use k8s_openapi::api::core::v1::{ConfigMap, Node, PersistentVolumeClaim, Pod};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::DynamicObject;

use crate::error::{QueryError, QueryResult};
use crate::k8s::resources;
use crate::models::{CheckResult, ComponentHealth, ReplicaStatus};
use crate::probe::ProbeOutcome;

/// How much a missing running pod matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Zero running pods fails the run
    Required,
    /// Auxiliary component; zero running pods is a warning
    Optional,
    /// Elastic pool that legitimately scales to zero
    ScaleToZero,
}

/// Key in the common runtime ConfigMap holding Druid's properties
pub const COMMON_PROPERTIES_KEY: &str = "common.runtime.properties";

/// Substring identifying the common runtime ConfigMap
pub const COMMON_CONFIG_MAP: &str = "common-conf";

pub fn query_failed(name: &str, err: &QueryError) -> CheckResult {
    CheckResult::fail(name, format!("(error listing) {err}"))
}

pub fn api_reachable(result: QueryResult<String>) -> CheckResult {
    match result {
        Ok(version) => CheckResult::pass("Cluster connectivity", format!("Kubernetes {version}")),
        Err(err) => query_failed("Cluster connectivity", &err),
    }
}

/// Ready node count, plus a warning when some nodes are not ready
pub fn node_readiness(result: QueryResult<Vec<Node>>) -> Vec<CheckResult> {
    let nodes = match result {
        Ok(nodes) => nodes,
        Err(err) => return vec![query_failed("List nodes", &err)],
    };

    let (ready, not_ready) = nodes
        .iter()
        .filter_map(resources::node_ready)
        .fold((0, 0), |(ready, not_ready), is_ready| {
            if is_ready {
                (ready + 1, not_ready)
            } else {
                (ready, not_ready + 1)
            }
        });

    let mut results = vec![CheckResult::pass("Nodes ready", ready.to_string())];
    if not_ready > 0 {
        results.push(CheckResult::warning("Nodes not ready", not_ready.to_string()));
    }
    results
}

/// Pass when a required object was found; absence and errors both fail
pub fn required_present<T>(name: &str, result: QueryResult<Option<T>>) -> CheckResult {
    match result {
        Ok(Some(_)) => CheckResult::pass(name, "present"),
        Ok(None) => CheckResult::fail(name, "not found"),
        Err(err) if err.is_not_found() => CheckResult::fail(name, "not found"),
        Err(err) => query_failed(name, &err),
    }
}

pub fn crd_present(
    display: &str,
    crd: &str,
    result: QueryResult<Option<CustomResourceDefinition>>,
) -> CheckResult {
    match result {
        Ok(Some(_)) => CheckResult::pass(display, crd),
        Ok(None) => CheckResult::fail(display, format!("{crd} not found")),
        Err(err) => query_failed(display, &err),
    }
}

pub fn pods_running(
    name: &str,
    requirement: Requirement,
    result: QueryResult<Vec<Pod>>,
) -> CheckResult {
    let pods = match result {
        Ok(pods) => pods,
        Err(err) => return query_failed(name, &err),
    };

    let running = resources::count_running(&pods);
    if running > 0 {
        CheckResult::pass(name, format!("{running} running"))
    } else {
        nothing_running(name, requirement)
    }
}

fn nothing_running(name: &str, requirement: Requirement) -> CheckResult {
    match requirement {
        Requirement::Required => CheckResult::fail(name, "no pods running"),
        Requirement::Optional => CheckResult::warning(name, "no pods running (optional)"),
        Requirement::ScaleToZero => {
            CheckResult::warning(name, "no pods running (may scale to zero)")
        }
    }
}

/// Workers of a pool: one pass per non-empty kind, or a single result
/// governed by `requirement` when every kind is at zero
pub fn worker_pool(
    label: &str,
    requirement: Requirement,
    counts: &[(&str, usize)],
) -> Vec<CheckResult> {
    let results: Vec<CheckResult> = counts
        .iter()
        .filter(|(_, running)| *running > 0)
        .map(|(kind, running)| CheckResult::pass(*kind, format!("{running} running")))
        .collect();

    if results.is_empty() {
        vec![nothing_running(label, requirement)]
    } else {
        results
    }
}

/// Readiness of the first workload matching `component`
pub fn workload_ready(
    name: &str,
    component: &str,
    classifier: &Classifier,
    listing: &QueryResult<Vec<ReplicaStatus>>,
) -> CheckResult {
    let items = match listing {
        Ok(items) => items,
        Err(err) => return query_failed(name, err),
    };

    let selected = classifier.select_component(items, component);
    match (ReplicaStatus::health_of(selected), selected) {
        (ComponentHealth::Healthy, Some(status)) => CheckResult::pass(
            name,
            format!("{} {}/{} ready", status.name, status.ready, status.desired),
        ),
        (_, Some(status)) => CheckResult::fail(
            name,
            format!("{} {}/{} ready", status.name, status.ready, status.desired),
        ),
        (_, None) => CheckResult::warning(name, "not found (may be optional/not deployed)"),
    }
}

/// Ready-condition ratio across custom resources such as ExternalSecrets
pub fn conditions_synced(name: &str, listing: &QueryResult<Vec<DynamicObject>>) -> CheckResult {
    let items = match listing {
        Ok(items) => items,
        Err(err) if err.is_not_found() => {
            return CheckResult::warning(name, "resource type not installed")
        }
        Err(err) => return query_failed(name, err),
    };

    let total = items.len();
    let synced = items
        .iter()
        .filter(|obj| resources::has_ready_condition(obj))
        .count();
    let message = format!("{synced}/{total} synced");

    if total == 0 {
        CheckResult::warning(name, "none defined")
    } else if synced == total {
        CheckResult::pass(name, message)
    } else if synced == 0 {
        CheckResult::fail(name, message)
    } else {
        CheckResult::warning(name, message)
    }
}

/// Count of an optional resource kind; zero or an uninstalled type warns
pub fn presence(name: &str, result: QueryResult<usize>) -> CheckResult {
    match result {
        Ok(0) => CheckResult::warning(name, "none found"),
        Ok(count) => CheckResult::pass(name, count.to_string()),
        Err(err) if err.is_not_found() => CheckResult::warning(name, "not installed"),
        Err(err) => query_failed(name, &err),
    }
}

/// Pass when an optional item was found, otherwise a warning
pub fn found_or_warn(name: &str, found: bool, missing: &str) -> CheckResult {
    if found {
        CheckResult::pass(name, "exists")
    } else {
        CheckResult::warning(name, missing)
    }
}

/// Names of matching resources summarised in one line; none matching warns
pub fn named_matches(name: &str, result: QueryResult<Vec<String>>, missing: &str) -> CheckResult {
    match result {
        Ok(names) if names.is_empty() => CheckResult::warning(name, missing),
        Ok(names) => CheckResult::pass(name, format!("{} ({})", names.len(), names.join(", "))),
        Err(err) if err.is_not_found() => CheckResult::warning(name, "not installed"),
        Err(err) => query_failed(name, &err),
    }
}

/// One pass per matching resource, or a single warning when none match
pub fn each_found(name: &str, names: Vec<String>, missing: &str) -> Vec<CheckResult> {
    if names.is_empty() {
        return vec![CheckResult::warning(name, missing)];
    }
    names
        .into_iter()
        .map(|found| CheckResult::pass(name, found))
        .collect()
}

pub fn endpoint_health(name: &str, outcome: &ProbeOutcome) -> CheckResult {
    match outcome {
        ProbeOutcome::Status(200) => CheckResult::pass(name, "OK"),
        ProbeOutcome::Status(code) => CheckResult::warning(name, format!("HTTP {code}")),
        ProbeOutcome::Unreachable(_) => {
            CheckResult::warning(name, "not reachable externally (may require VPN)")
        }
    }
}

/// Discovery of an aggregated API. Best-effort: any failure warns.
pub fn api_group_available(name: &str, result: QueryResult<Vec<String>>) -> CheckResult {
    match result {
        Ok(_) => CheckResult::pass(name, "available"),
        Err(err) if err.is_not_found() => CheckResult::warning(name, "not available"),
        Err(err) => CheckResult::warning(name, format!("not available ({err})")),
    }
}

pub fn ingress_summary(result: QueryResult<Vec<Ingress>>) -> CheckResult {
    let ingresses = match result {
        Ok(ingresses) => ingresses,
        Err(err) => return query_failed("Ingresses", &err),
    };

    let with_lb = ingresses
        .iter()
        .filter(|ingress| resources::ingress_has_load_balancer(ingress))
        .count();

    if ingresses.is_empty() {
        CheckResult::warning("Ingresses", "none found")
    } else {
        CheckResult::pass(
            "Ingresses",
            format!("{} total, {with_lb} with LoadBalancer", ingresses.len()),
        )
    }
}

pub fn pvc_binding(result: QueryResult<Vec<PersistentVolumeClaim>>) -> CheckResult {
    let claims = match result {
        Ok(claims) => claims,
        Err(err) => return query_failed("PVCs", &err),
    };

    let bound = claims.iter().filter(|pvc| resources::pvc_is_bound(pvc)).count();
    let message = format!("{} total, {bound} bound", claims.len());

    if claims.is_empty() {
        CheckResult::warning("PVCs", "none found")
    } else if bound == claims.len() {
        CheckResult::pass("PVCs", message)
    } else {
        CheckResult::warning("PVCs", message)
    }
}

/// Kubernetes-native discovery settings in the common runtime properties.
///
/// The discovery type is authoritative; ZooKeeper and the cluster identifier
/// are advisory.
pub fn discovery_settings(config_maps: &[ConfigMap]) -> Vec<CheckResult> {
    let common = config_maps.iter().find(|cm| {
        cm.metadata
            .name
            .as_deref()
            .is_some_and(|name| name.contains(COMMON_CONFIG_MAP))
    });

    let Some(properties) = common
        .and_then(|cm| cm.data.as_ref())
        .and_then(|data| data.get(COMMON_PROPERTIES_KEY))
    else {
        return vec![CheckResult::warning(
            "Discovery configuration",
            "common runtime properties ConfigMap not found",
        )];
    };

    let settings = RuntimeProperties::parse(properties);
    let mut results = Vec::with_capacity(3);

    if settings.get("druid.discovery.type") == Some("k8s") {
        results.push(CheckResult::pass("Discovery type", "druid.discovery.type=k8s"));
    } else {
        results.push(CheckResult::fail(
            "Discovery type",
            "druid.discovery.type not set to k8s",
        ));
    }

    if settings.get("druid.zk.service.enabled") == Some("false") {
        results.push(CheckResult::pass(
            "ZooKeeper",
            "disabled (druid.zk.service.enabled=false)",
        ));
    } else {
        results.push(CheckResult::warning(
            "ZooKeeper",
            "still enabled (deprecated with k8s discovery)",
        ));
    }

    if settings.has("druid.discovery.k8s.clusterIdentifier") {
        results.push(CheckResult::pass(
            "k8s cluster identifier",
            "configured",
        ));
    } else {
        results.push(CheckResult::warning(
            "k8s cluster identifier",
            "druid.discovery.k8s.clusterIdentifier not set",
        ));
    }

    results
}

/// Minimal reader for Java-style `key=value` properties
struct RuntimeProperties<'a> {
    entries: Vec<(&'a str, &'a str)>,
}

impl<'a> RuntimeProperties<'a> {
    fn parse(text: &'a str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| {
                line.split_once(['=', ':'])
                    .map(|(key, value)| (key.trim(), value.trim()))
            })
            .collect();
        Self { entries }
    }

    /// Last assignment wins, as with java.util.Properties
    fn get(&self, key: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }
}
