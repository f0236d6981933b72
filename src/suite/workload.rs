//! The Druid cluster itself: components, ingestion, services, ingress and node pools

use kube::api::DynamicObject;

use super::{Recorder, SmokeSuite};
use crate::checks::{self, Requirement};
use crate::error::QueryResult;
use crate::k8s::{resources, ClusterApi};
use crate::models::{CheckResult, ReplicaStatus, ResourceQuery};
use crate::probe::EndpointProbe;

/// Components deployed as StatefulSets: (component, display name)
const STATEFUL_COMPONENTS: [(&str, &str); 3] = [
    ("coordinator", "Druid Coordinator"),
    ("overlord", "Druid Overlord"),
    ("historical", "Druid Historical"),
];

/// Components deployed as Deployments
const DEPLOYED_COMPONENTS: [(&str, &str); 2] = [
    ("broker", "Druid Broker"),
    ("router", "Druid Router"),
];

const SERVICE_COMPONENTS: [&str; 5] = ["broker", "coordinator", "router", "overlord", "historical"];

const MIDDLE_MANAGER: [&str; 2] = ["middlemanager", "middle-manager"];
const INDEXER: [&str; 1] = ["indexer"];

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_workload(&self, out: &mut Recorder<'_>) {
        let namespace = match self.find_workload_namespace().await {
            Ok(Some(namespace)) => namespace,
            Ok(None) => {
                out.record(CheckResult::fail("Druid namespace", "not found"));
                return;
            }
            Err(err) => {
                out.record(checks::query_failed("Druid namespace", &err));
                return;
            }
        };
        out.record(CheckResult::pass("Druid namespace", namespace.as_str()));
        let query = ResourceQuery::namespaced(&namespace);

        out.section("Druid Core Components");
        let stateful_sets = self
            .cluster
            .list_stateful_sets(&query)
            .await
            .map(|items| items.iter().map(ReplicaStatus::from).collect::<Vec<_>>());
        for (component, name) in STATEFUL_COMPONENTS {
            out.record(checks::workload_ready(
                name,
                component,
                &self.classifier,
                &stateful_sets,
            ));
        }

        let deployments = self
            .cluster
            .list_deployments(&query)
            .await
            .map(|items| items.iter().map(ReplicaStatus::from).collect::<Vec<_>>());
        for (component, name) in DEPLOYED_COMPONENTS {
            out.record(checks::workload_ready(
                name,
                component,
                &self.classifier,
                &deployments,
            ));
        }

        out.section("Druid Data Ingestion");
        match self.cluster.list_pods(&query).await {
            Ok(pods) => {
                let running = |aliases: &[&str]| {
                    let metas = pods
                        .iter()
                        .filter(|pod| resources::pod_is_running(pod))
                        .map(|pod| &pod.metadata);
                    self.classifier.components(metas, aliases).len()
                };
                out.extend(checks::worker_pool(
                    "MiddleManagers/Indexers",
                    Requirement::ScaleToZero,
                    &[
                        ("MiddleManagers", running(&MIDDLE_MANAGER)),
                        ("Indexers", running(&INDEXER)),
                    ],
                ));
            }
            Err(err) => out.record(checks::query_failed("MiddleManagers/Indexers", &err)),
        }

        out.section("Druid Services");
        match self.cluster.list_services(&query).await {
            Ok(services) => {
                for component in SERVICE_COMPONENTS {
                    let found = !self
                        .classifier
                        .components(services.iter().map(|svc| &svc.metadata), &[component])
                        .is_empty();
                    out.record(checks::found_or_warn(
                        &format!("Service: {component}"),
                        found,
                        "no Service found",
                    ));
                }
            }
            Err(err) => out.record(checks::query_failed("Druid Services", &err)),
        }

        out.section("Druid Health Endpoints");
        self.check_health_endpoint(out, &query).await;

        out.section("Druid Karpenter NodePools");
        let pools = self
            .cluster
            .list_custom(&resources::NODE_POOLS, &ResourceQuery::all())
            .await;
        out.record(checks::named_matches(
            "Druid NodePools",
            self.workload_pool_names(pools),
            "no Druid-specific NodePools found",
        ));
    }

    /// Ingress host containing the workload keyword, then one GET against it
    async fn check_health_endpoint(&self, out: &mut Recorder<'_>, query: &ResourceQuery) {
        let ingresses = match self.cluster.list_ingresses(query).await {
            Ok(ingresses) => ingresses,
            Err(err) => {
                out.record(checks::query_failed("Druid ingress", &err));
                return;
            }
        };

        let keyword = self.keyword().to_lowercase();
        let host = ingresses
            .iter()
            .filter_map(resources::first_rule_host)
            .find(|host| host.to_lowercase().contains(&keyword));

        let Some(host) = host else {
            out.record(CheckResult::warning("Druid ingress", "no ingress host found"));
            return;
        };
        out.record(CheckResult::pass("Druid ingress", host));

        let outcome = self.probe.probe(&self.config.health_url(host)).await;
        out.record(checks::endpoint_health("Druid Router health", &outcome));
    }

    fn workload_pool_names(
        &self,
        pools: QueryResult<Vec<DynamicObject>>,
    ) -> QueryResult<Vec<String>> {
        let keyword = self.keyword().to_lowercase();
        pools.map(|pools| {
            pools
                .into_iter()
                .filter_map(|pool| pool.metadata.name)
                .filter(|name| {
                    name.contains(&keyword)
                        || SERVICE_COMPONENTS.iter().any(|c| name.contains(c))
                        || MIDDLE_MANAGER.iter().any(|c| name.contains(c))
                })
                .collect()
        })
    }
}
