//! Resource descriptors for child pipeline resources
//!
//! Builders here are pure: they turn a parameter set into a dynamic object
//! tagged with the child's group/version/kind. Values are copied verbatim,
//! validation belongs to whoever produced the parameters.

use crate::crds::{
    XJoinDataSourcePipeline, XJoinDataSourceSpec, XJoinIndexPipeline, XJoinIndexSpec,
    XJoinIndexValidator,
};
use crate::tasks::labels::{child_name, LABEL_COMPONENT_NAME};
use kube::api::{ApiResource, DynamicObject};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of child resource managed by the convergence engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    DataSourcePipeline,
    IndexPipeline,
    IndexValidator,
}

impl ChildKind {
    #[must_use]
    pub fn api_resource(self) -> ApiResource {
        match self {
            Self::DataSourcePipeline => ApiResource::erase::<XJoinDataSourcePipeline>(&()),
            Self::IndexPipeline => ApiResource::erase::<XJoinIndexPipeline>(&()),
            Self::IndexValidator => ApiResource::erase::<XJoinIndexValidator>(&()),
        }
    }

    #[must_use]
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::DataSourcePipeline => "XJoinDataSourcePipeline",
            Self::IndexPipeline => "XJoinIndexPipeline",
            Self::IndexValidator => "XJoinIndexValidator",
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// Parameters copied into every `XJoinDataSourcePipeline`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceParameters {
    pub avro_schema: String,
    pub database_hostname: String,
    pub database_port: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,
    pub pause: bool,
}

impl From<&XJoinDataSourceSpec> for DataSourceParameters {
    fn from(spec: &XJoinDataSourceSpec) -> Self {
        Self {
            avro_schema: spec.avro_schema.clone(),
            database_hostname: spec.database_hostname.clone(),
            database_port: spec.database_port.clone(),
            database_name: spec.database_name.clone(),
            database_username: spec.database_username.clone(),
            database_password: spec.database_password.clone(),
            pause: spec.pause,
        }
    }
}

/// Parameters copied into index pipelines and validators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexParameters {
    pub avro_schema: String,
    pub pause: bool,
}

impl From<&XJoinIndexSpec> for IndexParameters {
    fn from(spec: &XJoinIndexSpec) -> Self {
        Self {
            avro_schema: spec.avro_schema.clone(),
            pause: spec.pause,
        }
    }
}

/// Build a child descriptor named `<parent_name>.<version>` carrying the
/// ownership label and the given spec payload.
#[must_use]
pub fn build_descriptor(
    kind: ChildKind,
    parent_name: &str,
    namespace: &str,
    version: &str,
    spec: Value,
) -> DynamicObject {
    let mut object = DynamicObject::new(&child_name(parent_name, version), &kind.api_resource())
        .within(namespace)
        .data(json!({ "spec": spec }));
    object.metadata.labels = Some(BTreeMap::from([(
        LABEL_COMPONENT_NAME.to_string(),
        parent_name.to_string(),
    )]));
    object
}

#[must_use]
pub fn data_source_pipeline(
    parent_name: &str,
    namespace: &str,
    version: &str,
    parameters: &DataSourceParameters,
) -> DynamicObject {
    let spec = json!({
        "name": parent_name,
        "version": version,
        "avroSchema": parameters.avro_schema,
        "databaseHostname": parameters.database_hostname,
        "databasePort": parameters.database_port,
        "databaseName": parameters.database_name,
        "databaseUsername": parameters.database_username,
        "databasePassword": parameters.database_password,
        "pause": parameters.pause,
    });
    build_descriptor(
        ChildKind::DataSourcePipeline,
        parent_name,
        namespace,
        version,
        spec,
    )
}

/// Build an `XJoinIndexPipeline` or `XJoinIndexValidator` descriptor.
#[must_use]
pub fn index_child(
    kind: ChildKind,
    parent_name: &str,
    namespace: &str,
    version: &str,
    parameters: &IndexParameters,
) -> DynamicObject {
    let spec = json!({
        "version": version,
        "avroSchema": parameters.avro_schema,
        "pause": parameters.pause,
    });
    build_descriptor(kind, parent_name, namespace, version, spec)
}

/// Version recorded in an observed child's spec, if present and a string.
#[must_use]
pub fn observed_version(object: &DynamicObject) -> Option<&str> {
    object
        .data
        .get("spec")
        .and_then(|spec| spec.get("version"))
        .and_then(Value::as_str)
}
