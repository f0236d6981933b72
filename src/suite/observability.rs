//! Metrics pipeline, log and metric agents, and Druid scrape targets

use super::{PodCheck, Recorder, SmokeSuite};
use crate::checks::{self, Requirement};
use crate::k8s::{resources, ClusterApi};
use crate::models::{CheckResult, ResourceQuery};
use crate::probe::EndpointProbe;

const METRICS_SERVER: PodCheck = PodCheck::required(
    "kube-system",
    "app.kubernetes.io/name=metrics-server",
    "Metrics Server",
);

const MONITORING_NAMESPACE: &str = "monitoring";

const AGENTS: [PodCheck; 6] = [
    PodCheck::optional(
        "amazon-cloudwatch",
        "app.kubernetes.io/name=cloudwatch-agent",
        "CloudWatch Agent",
    ),
    PodCheck::optional(
        MONITORING_NAMESPACE,
        "app.kubernetes.io/name=alloy-logs",
        "Grafana Alloy (logs)",
    ),
    PodCheck::optional(
        MONITORING_NAMESPACE,
        "app.kubernetes.io/name=alloy-metrics",
        "Grafana Alloy (metrics)",
    ),
    PodCheck::optional(
        MONITORING_NAMESPACE,
        "app.kubernetes.io/name=alloy-singleton",
        "Grafana Alloy (singleton)",
    ),
    PodCheck::optional(
        MONITORING_NAMESPACE,
        "app.kubernetes.io/name=kube-state-metrics",
        "kube-state-metrics",
    ),
    PodCheck::optional(
        MONITORING_NAMESPACE,
        "app.kubernetes.io/name=node-exporter",
        "Node Exporter",
    ),
];

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_observability(&self, out: &mut Recorder<'_>) {
        out.section("Metrics Server");
        self.check_pods(out, &METRICS_SERVER).await;
        let metrics_api = self.cluster.api_resources(resources::METRICS_API).await;
        out.record(checks::api_group_available("Metrics API", metrics_api));

        out.section("Monitoring Agents");
        for check in &AGENTS {
            self.check_pods(out, check).await;
        }
        let monitoring = self
            .cluster
            .list_pods(&ResourceQuery::namespaced(MONITORING_NAMESPACE))
            .await;
        out.record(checks::pods_running(
            "Monitoring namespace",
            Requirement::Optional,
            monitoring,
        ));

        out.section("Druid Monitoring");
        self.check_workload_monitoring(out).await;
    }

    async fn check_workload_monitoring(&self, out: &mut Recorder<'_>) {
        let namespace = match self.find_workload_namespace().await {
            Ok(Some(namespace)) => namespace,
            Ok(None) => {
                out.record(CheckResult::warning(
                    "Druid monitoring",
                    "skipping - namespace not found",
                ));
                return;
            }
            Err(err) => {
                out.record(checks::query_failed("Druid monitoring", &err));
                return;
            }
        };
        let query = ResourceQuery::namespaced(&namespace);

        let monitors = self
            .cluster
            .list_custom(&resources::SERVICE_MONITORS, &query)
            .await
            .map(|monitors| monitors.len());
        out.record(checks::presence("Druid ServiceMonitors", monitors));

        match self.cluster.list_pods(&query).await {
            Ok(pods) => out.record(checks::found_or_warn(
                "Druid metrics ports",
                pods.iter().any(resources::exposes_metrics_port),
                "no pods expose a metrics port",
            )),
            Err(err) => out.record(checks::query_failed("Druid metrics ports", &err)),
        }
    }
}
