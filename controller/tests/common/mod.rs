#![allow(dead_code)]

//! In-memory gateway used by the scenario tests
//!
//! Enforces the gateway contract: unique child identities, delete of an absent
//! child is a no-op, and parent updates are checked against `resourceVersion`.

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use kube::{Resource, ResourceExt};
use pipeline_controller::crds::{
    XJoinDataSourceSpec, XJoinDataSourceStatus, XJoinIndexSpec, XJoinIndexStatus,
};
use pipeline_controller::tasks::descriptor::{build_descriptor, ChildKind};
use pipeline_controller::tasks::gateway::Gateway;
use pipeline_controller::tasks::types::{DATA_SOURCE_FINALIZER_NAME, INDEX_FINALIZER_NAME};
use pipeline_controller::{GatewayError, ParentObject, XJoinDataSource, XJoinIndex};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

pub const NAMESPACE: &str = "test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(ChildKind),
    Create(ChildKind, String),
    Delete(ChildKind, String),
    Update(String),
}

#[derive(Default)]
struct State {
    children: BTreeMap<(ChildKind, String, String), DynamicObject>,
    parents: BTreeMap<(String, String), ParentObject>,
    calls: Vec<Call>,
    failing_deletes: usize,
    list_delay: Option<Duration>,
    next_resource_version: u64,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

fn parent_meta_mut(parent: &mut ParentObject) -> &mut ObjectMeta {
    match parent {
        ParentObject::DataSource(data_source) => data_source.meta_mut(),
        ParentObject::Index(index) => index.meta_mut(),
    }
}

fn parent_meta(parent: &ParentObject) -> &ObjectMeta {
    match parent {
        ParentObject::DataSource(data_source) => data_source.meta(),
        ParentObject::Index(index) => index.meta(),
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn insert_child(&self, kind: ChildKind, object: DynamicObject) {
        let key = (
            kind,
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        self.lock().children.insert(key, object);
    }

    /// Store a parent and return the copy a client would have read back.
    pub fn insert_parent(&self, mut parent: ParentObject) -> ParentObject {
        let mut state = self.lock();
        state.next_resource_version += 1;
        parent_meta_mut(&mut parent).resource_version =
            Some(state.next_resource_version.to_string());
        let key = (parent.namespace().unwrap_or_default(), parent.name());
        state.parents.insert(key, parent.clone());
        parent
    }

    pub fn parent(&self, name: &str) -> Option<ParentObject> {
        self.lock()
            .parents
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
    }

    pub fn children(&self, kind: ChildKind) -> Vec<DynamicObject> {
        self.lock()
            .children
            .iter()
            .filter(|((k, _, _), _)| *k == kind)
            .map(|(_, object)| object.clone())
            .collect()
    }

    pub fn child_names(&self, kind: ChildKind) -> Vec<String> {
        self.children(kind).iter().map(ResourceExt::name_any).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of create and delete calls recorded so far.
    pub fn mutations(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Create(..) | Call::Delete(..)))
            .count()
    }

    /// Make the next `count` delete calls fail without touching state.
    pub fn fail_next_deletes(&self, count: usize) {
        self.lock().failing_deletes = count;
    }

    pub fn delay_lists(&self, delay: Duration) {
        self.lock().list_delay = Some(delay);
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list(
        &self,
        kind: ChildKind,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, GatewayError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(Call::List(kind));
            state.list_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let (label, value) = label_selector.split_once('=').unwrap_or((label_selector, ""));
        let state = self.lock();
        Ok(state
            .children
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && ns == namespace)
            .filter(|(_, object)| {
                object
                    .metadata
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get(label))
                    .is_some_and(|v| v == value)
            })
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn create(&self, kind: ChildKind, object: &DynamicObject) -> Result<(), GatewayError> {
        let mut state = self.lock();
        let name = object.name_any();
        state.calls.push(Call::Create(kind, name.clone()));

        let key = (kind, object.namespace().unwrap_or_default(), name.clone());
        if state.children.contains_key(&key) {
            return Err(GatewayError::AlreadyExists {
                kind: kind.to_string(),
                name,
            });
        }
        state.children.insert(key, object.clone());
        Ok(())
    }

    async fn delete(
        &self,
        kind: ChildKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete(kind, name.to_string()));

        if state.failing_deletes > 0 {
            state.failing_deletes -= 1;
            return Err(GatewayError::Timeout(Duration::from_secs(10)));
        }
        state
            .children
            .remove(&(kind, namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn update(&self, parent: &ParentObject) -> Result<ParentObject, GatewayError> {
        let mut state = self.lock();
        let name = parent.name();
        state.calls.push(Call::Update(name.clone()));

        let key = (parent.namespace().unwrap_or_default(), name.clone());
        let stored_version = state
            .parents
            .get(&key)
            .and_then(ParentObject::resource_version);
        if stored_version.is_none() || stored_version != parent.resource_version() {
            return Err(GatewayError::Conflict { name });
        }

        state.next_resource_version += 1;
        let mut updated = parent.clone();
        parent_meta_mut(&mut updated).resource_version =
            Some(state.next_resource_version.to_string());

        let meta = parent_meta(&updated);
        let released = meta.deletion_timestamp.is_some()
            && meta.finalizers.as_ref().map_or(true, Vec::is_empty);
        if released {
            state.parents.remove(&key);
        } else {
            state.parents.insert(key, updated.clone());
        }
        Ok(updated)
    }
}

pub fn data_source(name: &str, active: &str, refreshing: &str) -> XJoinDataSource {
    let mut data_source = XJoinDataSource::new(
        name,
        XJoinDataSourceSpec {
            avro_schema: r#"{"type":"record","name":"host"}"#.to_string(),
            database_hostname: "inventory-db".to_string(),
            database_port: "5432".to_string(),
            database_name: "inventory".to_string(),
            database_username: "reader".to_string(),
            database_password: "hunter2".to_string(),
            pause: false,
        },
    );
    data_source.metadata.namespace = Some(NAMESPACE.to_string());
    data_source.metadata.finalizers = Some(vec![DATA_SOURCE_FINALIZER_NAME.to_string()]);
    data_source.status = Some(XJoinDataSourceStatus {
        active_version: active.to_string(),
        refreshing_version: refreshing.to_string(),
    });
    data_source
}

pub fn index(name: &str, active: &str, refreshing: &str) -> XJoinIndex {
    let mut index = XJoinIndex::new(
        name,
        XJoinIndexSpec {
            avro_schema: r#"{"type":"record","name":"hosts"}"#.to_string(),
            pause: false,
        },
    );
    index.metadata.namespace = Some(NAMESPACE.to_string());
    index.metadata.finalizers = Some(vec![INDEX_FINALIZER_NAME.to_string()]);
    index.status = Some(XJoinIndexStatus {
        active_version: active.to_string(),
        refreshing_version: refreshing.to_string(),
    });
    index
}

/// A labelled child of `parent` at `version` with a marker payload.
pub fn existing_child(kind: ChildKind, parent: &str, version: &str) -> DynamicObject {
    build_descriptor(
        kind,
        parent,
        NAMESPACE,
        version,
        json!({ "version": version, "avroSchema": "previous" }),
    )
}
