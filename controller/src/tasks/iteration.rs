//! Per-invocation context shared by the data-source and index controllers
//!
//! An [`Iteration`] bundles the gateway handle, the parent instance and the
//! per-call deadline. It is built fresh for every reconcile or finalize.

use crate::crds::{ParentObject, XJoinDataSource, XJoinIndex};
use crate::tasks::descriptor::ChildKind;
use crate::tasks::gateway::Gateway;
use crate::tasks::labels::component_selector;
use crate::tasks::types::{
    Error, GatewayError, Result, DATA_SOURCE_FINALIZER_NAME, INDEX_FINALIZER_NAME,
};
use kube::api::DynamicObject;
use kube::{Resource, ResourceExt};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Parent kinds driven by the convergence engine.
pub trait ParentResource: Resource<DynamicType = ()> + Clone + Send + Sync {
    const FINALIZER_NAME: &'static str;

    fn active_version(&self) -> &str;
    fn refreshing_version(&self) -> &str;
    fn to_parent_object(&self) -> ParentObject;
    fn from_parent_object(parent: ParentObject) -> Option<Self>;
}

impl ParentResource for XJoinDataSource {
    const FINALIZER_NAME: &'static str = DATA_SOURCE_FINALIZER_NAME;

    fn active_version(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.active_version.as_str())
    }

    fn refreshing_version(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.refreshing_version.as_str())
    }

    fn to_parent_object(&self) -> ParentObject {
        ParentObject::DataSource(self.clone())
    }

    fn from_parent_object(parent: ParentObject) -> Option<Self> {
        match parent {
            ParentObject::DataSource(data_source) => Some(data_source),
            ParentObject::Index(_) => None,
        }
    }
}

impl ParentResource for XJoinIndex {
    const FINALIZER_NAME: &'static str = INDEX_FINALIZER_NAME;

    fn active_version(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.active_version.as_str())
    }

    fn refreshing_version(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.refreshing_version.as_str())
    }

    fn to_parent_object(&self) -> ParentObject {
        ParentObject::Index(self.clone())
    }

    fn from_parent_object(parent: ParentObject) -> Option<Self> {
        match parent {
            ParentObject::Index(index) => Some(index),
            ParentObject::DataSource(_) => None,
        }
    }
}

/// Where a parent sits in the finalizer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentPhase {
    /// Not being deleted and the finalizer marker has not been added yet
    Unclaimed,
    /// Not being deleted, finalizer present
    Active,
    /// Deletion requested while the finalizer is present
    Finalizing,
    /// Deletion requested and the finalizer is already gone
    Released,
}

#[must_use]
pub fn parent_phase<K: ParentResource>(parent: &K) -> ParentPhase {
    let deleting = parent.meta().deletion_timestamp.is_some();
    let claimed = parent.finalizers().iter().any(|f| f == K::FINALIZER_NAME);
    match (deleting, claimed) {
        (false, false) => ParentPhase::Unclaimed,
        (false, true) => ParentPhase::Active,
        (true, true) => ParentPhase::Finalizing,
        (true, false) => ParentPhase::Released,
    }
}

/// Desired child versions: active then refreshing, skipping empty and repeated values.
#[must_use]
pub fn desired_versions<K: ParentResource>(parent: &K) -> Vec<String> {
    let mut versions: Vec<String> = Vec::with_capacity(2);
    for version in [parent.active_version(), parent.refreshing_version()] {
        if !version.is_empty() && !versions.iter().any(|v| v == version) {
            versions.push(version.to_string());
        }
    }
    versions
}

pub struct Iteration<'a, K> {
    pub gateway: &'a dyn Gateway,
    pub instance: K,
    pub operation_timeout: Duration,
}

impl<'a, K: ParentResource> Iteration<'a, K> {
    pub fn new(gateway: &'a dyn Gateway, instance: K, operation_timeout: Duration) -> Self {
        Self {
            gateway,
            instance,
            operation_timeout,
        }
    }

    pub fn parent_name(&self) -> Result<String> {
        self.instance
            .meta()
            .name
            .clone()
            .ok_or(Error::MissingObjectKey)
    }

    pub fn namespace(&self) -> Result<String> {
        self.instance
            .namespace()
            .ok_or_else(|| Error::MissingNamespace(self.instance.name_any()))
    }

    /// Run a gateway call under the operation deadline.
    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, GatewayError>
    where
        F: Future<Output = std::result::Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.operation_timeout)),
        }
    }

    pub async fn list_children(&self, kind: ChildKind) -> Result<Vec<DynamicObject>> {
        let namespace = self.namespace()?;
        let selector = component_selector(&self.parent_name()?);
        self.bounded(self.gateway.list(kind, &namespace, &selector))
            .await
            .map_err(|e| Error::gateway(format!("list {kind} with {selector}"), e))
    }

    pub async fn create_child(&self, kind: ChildKind, object: &DynamicObject) -> Result<()> {
        let name = object.name_any();
        debug!("Creating {} {}", kind, name);
        self.bounded(self.gateway.create(kind, object))
            .await
            .map_err(|e| Error::gateway(format!("create {kind} {name}"), e))
    }

    pub async fn delete_child(&self, kind: ChildKind, name: &str) -> Result<()> {
        let namespace = self.namespace()?;
        debug!("Deleting {} {}", kind, name);
        self.bounded(self.gateway.delete(kind, &namespace, name))
            .await
            .map_err(|e| Error::gateway(format!("delete {kind} {name}"), e))
    }

    /// Persist the instance through the gateway and adopt the stored copy.
    pub async fn update_instance(&mut self) -> Result<()> {
        let candidate = self.instance.clone();
        self.persist(candidate).await
    }

    /// Write `candidate` and adopt the stored result. `self.instance` is left
    /// untouched when the gateway rejects the write.
    async fn persist(&mut self, candidate: K) -> Result<()> {
        let name = candidate.name_any();
        let parent = candidate.to_parent_object();
        let updated = self
            .bounded(self.gateway.update(&parent))
            .await
            .map_err(|e| Error::gateway(format!("update {name}"), e))?;
        self.instance = K::from_parent_object(updated).unwrap_or(candidate);
        Ok(())
    }

    pub async fn add_finalizer(&mut self) -> Result<()> {
        if self.instance.finalizers().iter().any(|f| f == K::FINALIZER_NAME) {
            return Ok(());
        }
        let mut candidate = self.instance.clone();
        candidate.finalizers_mut().push(K::FINALIZER_NAME.to_string());
        self.persist(candidate).await
    }

    pub async fn remove_finalizer(&mut self) -> Result<()> {
        let mut candidate = self.instance.clone();
        candidate.finalizers_mut().retain(|f| f != K::FINALIZER_NAME);
        self.persist(candidate).await
    }
}
