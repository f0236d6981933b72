//! Secrets management and policy engine configuration

use kube::api::DynamicObject;

use super::{Recorder, SmokeSuite};
use crate::checks;
use crate::error::QueryResult;
use crate::k8s::{resources, ClusterApi};
use crate::models::ResourceQuery;
use crate::probe::EndpointProbe;

/// ClusterSecretStore backing every ExternalSecret
pub const SECRET_STORE: &str = "aws-secrets-manager";

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_security(&self, out: &mut Recorder<'_>) {
        out.section("Secrets Management");
        let store = self.cluster_secret_store().await;
        out.record(checks::required_present(
            &format!("ClusterSecretStore '{SECRET_STORE}'"),
            store,
        ));

        let external_secrets = self
            .cluster
            .list_custom(&resources::EXTERNAL_SECRETS, &ResourceQuery::all())
            .await;
        out.record(checks::conditions_synced(
            "ExternalSecrets synced",
            &external_secrets,
        ));

        out.section("Kyverno Policies");
        let policies = self
            .cluster
            .list_custom(&resources::CLUSTER_POLICIES, &ResourceQuery::all())
            .await
            .map(|policies| policies.len());
        out.record(checks::presence("Kyverno policies", policies));
    }

    /// The store at `v1`, or at `v1beta1` when `v1` does not yield it
    async fn cluster_secret_store(&self) -> QueryResult<Option<DynamicObject>> {
        let query = ResourceQuery::all();
        match self
            .cluster
            .get_custom(&resources::CLUSTER_SECRET_STORES, &query, SECRET_STORE)
            .await
        {
            Ok(Some(store)) => Ok(Some(store)),
            Ok(None) => self.legacy_secret_store(&query).await,
            Err(err) if err.is_not_found() => self.legacy_secret_store(&query).await,
            Err(err) => Err(err),
        }
    }

    async fn legacy_secret_store(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Option<DynamicObject>> {
        let legacy = resources::CLUSTER_SECRET_STORES.at_version("v1beta1");
        self.cluster.get_custom(&legacy, query, SECRET_STORE).await
    }
}
