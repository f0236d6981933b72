//! Read-only capability interface over the cluster API
//!
//! Every call distinguishes three outcomes: a value (possibly an empty list),
//! absence (`QueryError::NotFound` or `Ok(None)`), and failure to ask at all
//! (`QueryError::Kube`). Checks attach different verdicts to each.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolumeClaim, Pod, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;

#[cfg(test)]
use mockall::automock;

use crate::error::QueryResult;
use crate::models::{Gvr, ResourceQuery};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Git version reported by the API server
    async fn server_version(&self) -> QueryResult<String>;

    /// Resource names served under a group/version such as `metrics.k8s.io/v1beta1`.
    /// An unserved group/version is `NotFound`.
    async fn api_resources(&self, group_version: &str) -> QueryResult<Vec<String>>;

    async fn get_namespace(&self, name: &str) -> QueryResult<Option<Namespace>>;

    async fn list_namespaces(&self) -> QueryResult<Vec<Namespace>>;

    async fn list_nodes(&self) -> QueryResult<Vec<Node>>;

    async fn list_pods(&self, query: &ResourceQuery) -> QueryResult<Vec<Pod>>;

    async fn list_services(&self, query: &ResourceQuery) -> QueryResult<Vec<Service>>;

    /// Secret metadata only; payloads are never fetched
    async fn list_secrets(&self, query: &ResourceQuery) -> QueryResult<Vec<ObjectMeta>>;

    async fn list_config_maps(&self, query: &ResourceQuery) -> QueryResult<Vec<ConfigMap>>;

    async fn list_service_accounts(&self, query: &ResourceQuery)
        -> QueryResult<Vec<ServiceAccount>>;

    async fn list_persistent_volume_claims(
        &self,
        query: &ResourceQuery,
    ) -> QueryResult<Vec<PersistentVolumeClaim>>;

    async fn list_stateful_sets(&self, query: &ResourceQuery) -> QueryResult<Vec<StatefulSet>>;

    async fn list_deployments(&self, query: &ResourceQuery) -> QueryResult<Vec<Deployment>>;

    async fn list_ingresses(&self, query: &ResourceQuery) -> QueryResult<Vec<Ingress>>;

    async fn get_crd(&self, name: &str) -> QueryResult<Option<CustomResourceDefinition>>;

    /// List custom resources. A resource type that is not installed is `NotFound`.
    async fn list_custom(&self, gvr: &Gvr, query: &ResourceQuery)
        -> QueryResult<Vec<DynamicObject>>;

    /// Get one custom resource. Leave `query.namespace` unset for cluster-scoped types.
    async fn get_custom(
        &self,
        gvr: &Gvr,
        query: &ResourceQuery,
        name: &str,
    ) -> QueryResult<Option<DynamicObject>>;
}
