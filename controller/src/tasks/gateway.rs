//! Child resource gateway
//!
//! The contract the convergence engine needs from the cluster: list children
//! by label, create (never upsert), delete (absent is success) and update a
//! parent under optimistic concurrency.

use crate::crds::{ParentObject, XJoinDataSource, XJoinIndex};
use crate::tasks::descriptor::ChildKind;
use crate::tasks::types::GatewayError;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// List every child of `kind` in `namespace` matching `label_selector`.
    async fn list(
        &self,
        kind: ChildKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, GatewayError>;

    /// Create a child. Fails with [`GatewayError::AlreadyExists`] when the
    /// identity is taken.
    async fn create(&self, kind: ChildKind, object: &DynamicObject) -> Result<(), GatewayError>;

    /// Delete a child. Deleting an absent child succeeds.
    async fn delete(&self, kind: ChildKind, namespace: &str, name: &str)
        -> Result<(), GatewayError>;

    /// Persist a parent. Fails with [`GatewayError::Conflict`] when the stored
    /// object changed since `parent` was read.
    async fn update(&self, parent: &ParentObject) -> Result<ParentObject, GatewayError>;
}

/// [`Gateway`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn children(&self, kind: ChildKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = kind.api_resource();
        match namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &resource),
            None => Api::default_namespaced_with(self.client.clone(), &resource),
        }
    }

    fn parents<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

#[async_trait]
impl Gateway for KubeGateway {
    async fn list(
        &self,
        kind: ChildKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, GatewayError> {
        let params = ListParams::default().labels(label_selector);
        let list = self.children(kind, Some(namespace)).list(&params).await?;
        Ok(list.items)
    }

    async fn create(&self, kind: ChildKind, object: &DynamicObject) -> Result<(), GatewayError> {
        let api = self.children(kind, object.metadata.namespace.as_deref());
        match api.create(&PostParams::default(), object).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 409 => {
                Err(GatewayError::AlreadyExists {
                    kind: kind.to_string(),
                    name: object.name_any(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(
        &self,
        kind: ChildKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), GatewayError> {
        let api = self.children(kind, Some(namespace));
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                debug!("{} {} already absent, nothing to delete", kind, name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, parent: &ParentObject) -> Result<ParentObject, GatewayError> {
        let namespace = parent.namespace();
        match parent {
            ParentObject::DataSource(data_source) => {
                let api: Api<XJoinDataSource> = self.parents(namespace.as_deref());
                replace(&api, data_source)
                    .await
                    .map(ParentObject::DataSource)
            }
            ParentObject::Index(index) => {
                let api: Api<XJoinIndex> = self.parents(namespace.as_deref());
                replace(&api, index).await.map(ParentObject::Index)
            }
        }
    }
}

/// Replace `object` using the `resourceVersion` it carries, so a stale copy is rejected.
async fn replace<K>(api: &Api<K>, object: &K) -> Result<K, GatewayError>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let name = object.name_any();
    match api.replace(&name, &PostParams::default(), object).await {
        Ok(updated) => Ok(updated),
        Err(kube::Error::Api(response)) if response.code == 409 => {
            Err(GatewayError::Conflict { name })
        }
        Err(e) => Err(e.into()),
    }
}
