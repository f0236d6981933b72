//! Test suite runner
//!
//! Runs a fixed, ordered battery of check groups against the cluster. Every
//! group always runs; a group whose precondition cannot be met records one
//! result and skips only its own checks. Results stream to the reporter as
//! they are recorded and accumulate in a [`ResultLog`] owned by the run.

mod addons;
mod cluster;
mod infrastructure;
mod networking;
mod observability;
mod security;
mod workload;

use tracing::{debug, info, instrument};

use crate::checks::{self, Classifier, Requirement};
use crate::config::Config;
use crate::error::QueryResult;
use crate::k8s::ClusterApi;
use crate::models::{CheckResult, ResourceQuery, ResultLog};
use crate::probe::EndpointProbe;
use crate::report::Reporter;

/// The check groups, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckGroup {
    ClusterHealth,
    CoreAddons,
    Security,
    Networking,
    Workload,
    WorkloadInfrastructure,
    Observability,
}

impl CheckGroup {
    pub const ALL: [CheckGroup; 7] = [
        CheckGroup::ClusterHealth,
        CheckGroup::CoreAddons,
        CheckGroup::Security,
        CheckGroup::Networking,
        CheckGroup::Workload,
        CheckGroup::WorkloadInfrastructure,
        CheckGroup::Observability,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CheckGroup::ClusterHealth => "EKS CLUSTER HEALTH",
            CheckGroup::CoreAddons => "CORE ADDONS",
            CheckGroup::Security => "SECURITY CONFIGURATION",
            CheckGroup::Networking => "NETWORKING",
            CheckGroup::Workload => "APACHE DRUID CLUSTER",
            CheckGroup::WorkloadInfrastructure => "DRUID INFRASTRUCTURE (AWS)",
            CheckGroup::Observability => "OBSERVABILITY",
        }
    }
}

/// Pods selected by label that must (or may) be running
pub(crate) struct PodCheck {
    pub namespace: &'static str,
    pub selector: &'static str,
    pub name: &'static str,
    pub requirement: Requirement,
}

impl PodCheck {
    pub const fn required(namespace: &'static str, selector: &'static str, name: &'static str) -> Self {
        Self {
            namespace,
            selector,
            name,
            requirement: Requirement::Required,
        }
    }

    pub const fn optional(namespace: &'static str, selector: &'static str, name: &'static str) -> Self {
        Self {
            namespace,
            selector,
            name,
            requirement: Requirement::Optional,
        }
    }
}

/// A CustomResourceDefinition that must be installed
pub(crate) struct CrdCheck {
    pub crd: &'static str,
    pub display: &'static str,
}

/// Appends results to the run's log and streams them to the reporter
pub struct Recorder<'r> {
    log: ResultLog,
    reporter: &'r mut dyn Reporter,
}

impl<'r> Recorder<'r> {
    pub fn new(reporter: &'r mut dyn Reporter) -> Self {
        Self {
            log: ResultLog::new(),
            reporter,
        }
    }

    pub fn group(&mut self, title: &str) {
        self.reporter.group(title);
    }

    pub fn section(&mut self, title: &str) {
        self.reporter.section(title);
    }

    pub fn record(&mut self, result: CheckResult) {
        debug!(check = %result.name, verdict = %result.verdict, message = %result.message, "Check complete");
        self.reporter.record(&result);
        self.log.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = CheckResult>) {
        for result in results {
            self.record(result);
        }
    }

    pub fn log(&self) -> &ResultLog {
        &self.log
    }

    pub fn finish(self) -> ResultLog {
        self.log
    }
}

pub struct SmokeSuite<C, P> {
    cluster: C,
    probe: P,
    config: Config,
    classifier: Classifier,
}

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub fn new(cluster: C, probe: P, config: Config) -> Self {
        let classifier = Classifier::new(config.purpose_label.clone());
        Self {
            cluster,
            probe,
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Run every group in order and report the summary
    pub async fn run(&self, reporter: &mut dyn Reporter) -> ResultLog {
        reporter.banner();

        let mut out = Recorder::new(reporter);
        for group in CheckGroup::ALL {
            self.run_group(group, &mut out).await;
        }
        let log = out.finish();

        let summary = log.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            warnings = summary.warnings,
            "Smoke test complete"
        );
        reporter.summary(log.results(), &summary);
        log
    }

    #[instrument(skip(self, out))]
    pub async fn run_group(&self, group: CheckGroup, out: &mut Recorder<'_>) {
        out.group(group.title());
        match group {
            CheckGroup::ClusterHealth => self.check_cluster(out).await,
            CheckGroup::CoreAddons => self.check_addons(out).await,
            CheckGroup::Security => self.check_security(out).await,
            CheckGroup::Networking => self.check_networking(out).await,
            CheckGroup::Workload => self.check_workload(out).await,
            CheckGroup::WorkloadInfrastructure => self.check_infrastructure(out).await,
            CheckGroup::Observability => self.check_observability(out).await,
        }
    }

    async fn check_pods(&self, out: &mut Recorder<'_>, check: &PodCheck) {
        let query = ResourceQuery::namespaced(check.namespace).labels(check.selector);
        let pods = self.cluster.list_pods(&query).await;
        out.record(checks::pods_running(check.name, check.requirement, pods));
    }

    async fn check_crd(&self, out: &mut Recorder<'_>, check: &CrdCheck) {
        let crd = self.cluster.get_crd(check.crd).await;
        out.record(checks::crd_present(check.display, check.crd, crd));
    }

    /// Workload namespace: configured candidates first, then any namespace
    /// whose name contains the workload keyword.
    pub async fn find_workload_namespace(&self) -> QueryResult<Option<String>> {
        for candidate in &self.config.namespace_candidates {
            if self.cluster.get_namespace(candidate).await?.is_some() {
                return Ok(Some(candidate.clone()));
            }
        }

        let keyword = self.config.workload_keyword.to_lowercase();
        let namespaces = self.cluster.list_namespaces().await?;
        Ok(namespaces
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .find(|name| name.to_lowercase().contains(&keyword)))
    }

    fn keyword(&self) -> &str {
        &self.config.workload_keyword
    }
}
