//! AWS-backed plumbing around the Druid namespace: identities, credentials,
//! configuration, storage and Kafka access

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::{Recorder, SmokeSuite};
use crate::checks::{self, Purpose};
use crate::k8s::{resources, ClusterApi};
use crate::models::{CheckResult, ResourceQuery};
use crate::probe::EndpointProbe;

const NAMESPACE_CHECK: &str = "Druid namespace";

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_infrastructure(&self, out: &mut Recorder<'_>) {
        let namespace = match self.find_workload_namespace().await {
            Ok(Some(namespace)) => namespace,
            Ok(None) => {
                out.record(CheckResult::warning(
                    NAMESPACE_CHECK,
                    "skipping infrastructure checks - namespace not found",
                ));
                return;
            }
            Err(err) => {
                out.record(checks::query_failed(NAMESPACE_CHECK, &err));
                return;
            }
        };
        let query = ResourceQuery::namespaced(&namespace);

        out.section("IRSA Service Accounts");
        let accounts = self.cluster.list_service_accounts(&query).await;
        let account_names = accounts.as_ref().map(|accounts| {
            accounts
                .iter()
                .filter_map(|sa| sa.metadata.name.clone())
                .collect::<Vec<_>>()
        });
        out.record(match &account_names {
            Ok(names) => checks::presence("ServiceAccounts", Ok(names.len())),
            Err(err) => checks::query_failed("ServiceAccounts", err),
        });

        out.section("External Secrets (Druid)");
        self.check_namespace_external_secrets(out, &query).await;

        out.section("Secrets");
        match self.cluster.list_secrets(&query).await {
            Ok(secrets) => {
                out.record(self.classified(
                    "Metadata store credentials",
                    &secrets,
                    Purpose::MetadataStore,
                ));
                out.record(self.classified(
                    "Admin credentials",
                    &secrets,
                    Purpose::AdminCredentials,
                ));
            }
            Err(err) => out.record(checks::query_failed("Secrets", &err)),
        }

        out.section("Druid Configuration");
        match self.cluster.list_config_maps(&query).await {
            Ok(config_maps) => self.check_config_maps(out, &config_maps),
            Err(err) => out.record(checks::query_failed("Druid ConfigMaps", &err)),
        }

        out.section("Persistent Storage");
        let claims = self.cluster.list_persistent_volume_claims(&query).await;
        out.record(checks::pvc_binding(claims));

        out.section("Headless Services");
        match self.cluster.list_services(&query).await {
            Ok(services) => {
                let headless = services
                    .iter()
                    .filter(|svc| resources::is_headless(svc))
                    .filter_map(|svc| svc.metadata.name.clone())
                    .collect();
                out.extend(checks::each_found(
                    "Headless Service",
                    headless,
                    "no headless Services found",
                ));
            }
            Err(err) => out.record(checks::query_failed("Headless Services", &err)),
        }

        out.section("Druid ServiceAccount");
        match account_names {
            Ok(names) => {
                let keyword = self.keyword().to_lowercase();
                match names.iter().find(|name| name.to_lowercase().contains(&keyword)) {
                    Some(name) => out.record(CheckResult::pass("Druid ServiceAccount", name.as_str())),
                    None => out.record(CheckResult::warning(
                        "Druid ServiceAccount",
                        "no Druid ServiceAccount found",
                    )),
                }
            }
            Err(err) => out.record(checks::query_failed("Druid ServiceAccount", &err)),
        }

        out.section("MSK/Kafka Access");
        match self.cluster.list_service_accounts(&ResourceQuery::all()).await {
            Ok(accounts) => {
                let streaming = self
                    .classifier
                    .with_purpose(accounts.iter().map(|sa| &sa.metadata), Purpose::Streaming)
                    .into_iter()
                    .filter_map(|meta| meta.name.clone())
                    .collect();
                out.extend(checks::each_found(
                    "MSK ServiceAccount",
                    streaming,
                    "no MSK/Kafka ServiceAccounts found (may not use Kafka ingestion)",
                ));
            }
            Err(err) => out.record(checks::query_failed("MSK ServiceAccounts", &err)),
        }
    }

    async fn check_namespace_external_secrets(&self, out: &mut Recorder<'_>, query: &ResourceQuery) {
        let listing = self
            .cluster
            .list_custom(&resources::EXTERNAL_SECRETS, query)
            .await;
        out.record(checks::conditions_synced("Druid ExternalSecrets", &listing));

        if let Ok(items) = &listing {
            let metas: Vec<ObjectMeta> = items.iter().map(|obj| obj.metadata.clone()).collect();
            out.record(self.classified(
                "Admin credentials ExternalSecret",
                &metas,
                Purpose::AdminCredentials,
            ));
            out.record(self.classified(
                "Metadata store ExternalSecret",
                &metas,
                Purpose::MetadataStore,
            ));
        }
    }

    /// ConfigMaps are listed once and shared by the Druid, discovery and
    /// leader-election checks
    fn check_config_maps(&self, out: &mut Recorder<'_>, config_maps: &[ConfigMap]) {
        let keyword = self.keyword().to_lowercase();
        let druid = config_maps
            .iter()
            .filter(|cm| {
                cm.metadata
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&keyword))
            })
            .count();
        out.record(checks::presence("Druid ConfigMaps", Ok(druid)));

        out.section("Kubernetes Discovery");
        out.extend(checks::discovery_settings(config_maps));

        out.section("Leader Election");
        let leader_election = self
            .classifier
            .with_purpose(
                config_maps.iter().map(|cm| &cm.metadata),
                Purpose::LeaderElection,
            )
            .into_iter()
            .filter_map(|meta| meta.name.clone())
            .collect();
        out.extend(checks::each_found(
            "Leader election ConfigMap",
            leader_election,
            "none yet (created when Druid starts)",
        ));
    }

    fn classified(&self, name: &str, items: &[ObjectMeta], purpose: Purpose) -> CheckResult {
        match self
            .classifier
            .with_purpose(items, purpose)
            .first()
            .and_then(|meta| meta.name.as_deref())
        {
            Some(found) => CheckResult::pass(name, found),
            None => CheckResult::warning(name, format!("no {purpose} resource found")),
        }
    }
}
