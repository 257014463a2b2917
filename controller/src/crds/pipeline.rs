//! Child pipeline Custom Resource Definitions
//!
//! Children are versioned and immutable once created: a new version is a new
//! object named `<parent>.<version>`, never an update of an existing spec.
//! The controller writes them as dynamic objects built from these kinds.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(
    group = "xjoin.cloud.redhat.com",
    version = "v1alpha1",
    kind = "XJoinDataSourcePipeline"
)]
#[kube(namespaced)]
#[kube(printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#)]
#[serde(rename_all = "camelCase")]
pub struct XJoinDataSourcePipelineSpec {
    /// Name of the owning `XJoinDataSource`
    pub name: String,
    pub version: String,
    pub avro_schema: String,
    pub database_hostname: String,
    pub database_port: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,
    #[serde(default)]
    pub pause: bool,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(
    group = "xjoin.cloud.redhat.com",
    version = "v1alpha1",
    kind = "XJoinIndexPipeline"
)]
#[kube(namespaced)]
#[kube(printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#)]
#[serde(rename_all = "camelCase")]
pub struct XJoinIndexPipelineSpec {
    pub version: String,
    pub avro_schema: String,
    #[serde(default)]
    pub pause: bool,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(
    group = "xjoin.cloud.redhat.com",
    version = "v1alpha1",
    kind = "XJoinIndexValidator"
)]
#[kube(namespaced)]
#[kube(printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#)]
#[serde(rename_all = "camelCase")]
pub struct XJoinIndexValidatorSpec {
    pub version: String,
    pub avro_schema: String,
    #[serde(default)]
    pub pause: bool,
}
