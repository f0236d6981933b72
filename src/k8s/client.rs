//! Kubernetes client wrapper backing the cluster facade

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolumeClaim, Pod, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, DynamicObject, ListParams},
    discovery::ApiResource,
    Client, Config, Resource,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use super::api::ClusterApi;
use crate::error::{InitError, QueryError, QueryResult};
use crate::models::{Gvr, ResourceQuery};

/// Wrapper around kube::Client implementing the read-only [`ClusterApi`]
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Create a client from the default kubeconfig or in-cluster config
    #[instrument(skip_all)]
    pub async fn new() -> Result<Self, InitError> {
        let config = Config::infer().await?;
        let client = Client::try_from(config)?;

        info!("Kubernetes client configured");

        Ok(Self { client })
    }

    fn namespaced_api<K>(&self, query: &ResourceQuery) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        match &query.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    async fn list_namespaced<K>(&self, query: &ResourceQuery) -> QueryResult<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = self.namespaced_api(query);
        let list = api
            .list(&list_params(query))
            .await
            .map_err(|e| QueryError::from_kube(e, &kind_of::<K>(), &query.scope()))?;
        debug!(kind = %kind_of::<K>(), scope = %query.scope(), count = list.items.len(), "Listed");
        Ok(list.items)
    }

    fn dynamic_api(&self, gvr: &Gvr, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = ApiResource {
            group: gvr.group.to_string(),
            version: gvr.version.to_string(),
            api_version: gvr.api_version(),
            kind: gvr.kind.to_string(),
            plural: gvr.plural.to_string(),
        };

        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

fn list_params(query: &ResourceQuery) -> ListParams {
    match &query.label_selector {
        Some(selector) => ListParams::default().labels(selector),
        None => ListParams::default(),
    }
}

fn kind_of<K>() -> String
where
    K: Resource,
    <K as Resource>::DynamicType: Default,
{
    K::kind(&Default::default()).to_string()
}

#[async_trait]
impl ClusterApi for KubeCluster {
    #[instrument(skip(self))]
    async fn server_version(&self) -> QueryResult<String> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(QueryError::Kube)?;
        info!(version = %version.git_version, "Kubernetes cluster is reachable");
        Ok(version.git_version)
    }

    #[instrument(skip(self))]
    async fn api_resources(&self, group_version: &str) -> QueryResult<Vec<String>> {
        let list = self
            .client
            .list_api_group_resources(group_version)
            .await
            .map_err(|e| QueryError::from_kube(e, "api group", group_version))?;
        Ok(list.resources.into_iter().map(|r| r.name).collect())
    }

    #[instrument(skip(self))]
    async fn get_namespace(&self, name: &str) -> QueryResult<Option<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.get_opt(name).await.map_err(QueryError::Kube)
    }

    #[instrument(skip(self))]
    async fn list_namespaces(&self) -> QueryResult<Vec<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(QueryError::Kube)?;
        Ok(list.items)
    }

    #[instrument(skip(self))]
    async fn list_nodes(&self) -> QueryResult<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(QueryError::Kube)?;
        Ok(list.items)
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_pods(&self, query: &ResourceQuery) -> QueryResult<Vec<Pod>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_services(&self, query: &ResourceQuery) -> QueryResult<Vec<Service>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_secrets(&self, query: &ResourceQuery) -> QueryResult<Vec<ObjectMeta>> {
        let api: Api<Secret> = self.namespaced_api(query);
        let list = api
            .list_metadata(&list_params(query))
            .await
            .map_err(|e| QueryError::from_kube(e, "Secret", &query.scope()))?;
        Ok(list.items.into_iter().map(|partial| partial.metadata).collect())
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_config_maps(&self, query: &ResourceQuery) -> QueryResult<Vec<ConfigMap>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_service_accounts(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<ServiceAccount>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_persistent_volume_claims(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<PersistentVolumeClaim>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_stateful_sets(&self, query: &ResourceQuery) -> QueryResult<Vec<StatefulSet>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_deployments(&self, query: &ResourceQuery) -> QueryResult<Vec<Deployment>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self, query), fields(scope = %query.scope()))]
    async fn list_ingresses(&self, query: &ResourceQuery) -> QueryResult<Vec<Ingress>> {
        self.list_namespaced(query).await
    }

    #[instrument(skip(self))]
    async fn get_crd(&self, name: &str) -> QueryResult<Option<CustomResourceDefinition>> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        api.get_opt(name).await.map_err(QueryError::Kube)
    }

    #[instrument(skip(self, query), fields(gvr = %gvr, scope = %query.scope()))]
    async fn list_custom(
        &self,
        gvr: &Gvr,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<DynamicObject>> {
        let api = self.dynamic_api(gvr, query.namespace.as_deref());
        let list = api
            .list(&list_params(query))
            .await
            .map_err(|e| QueryError::from_kube(e, gvr.kind, &gvr.to_string()))?;
        debug!(count = list.items.len(), "Listed custom resources");
        Ok(list.items)
    }

    #[instrument(skip(self, query), fields(gvr = %gvr, scope = %query.scope()))]
    async fn get_custom(
        &self,
        gvr: &Gvr,
        query: &ResourceQuery,
        name: &str,
    ) -> QueryResult<Option<DynamicObject>> {
        let api = self.dynamic_api(gvr, query.namespace.as_deref());
        api.get_opt(name).await.map_err(QueryError::Kube)
    }
}
