//! `XJoinDataSource` Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A data source declaration. Each version listed in the status is realised as
/// one `XJoinDataSourcePipeline` child.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "xjoin.cloud.redhat.com",
    version = "v1alpha1",
    kind = "XJoinDataSource"
)]
#[kube(namespaced)]
#[kube(status = "XJoinDataSourceStatus")]
#[kube(printcolumn = r#"{"name":"Active","type":"string","jsonPath":".status.activeVersion"}"#)]
#[kube(
    printcolumn = r#"{"name":"Refreshing","type":"string","jsonPath":".status.refreshingVersion"}"#
)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
#[serde(rename_all = "camelCase")]
pub struct XJoinDataSourceSpec {
    /// Avro schema of the records produced by this data source
    #[serde(default)]
    pub avro_schema: String,
    #[serde(default)]
    pub database_hostname: String,
    #[serde(default)]
    pub database_port: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub database_username: String,
    #[serde(default)]
    pub database_password: String,
    /// Pauses every pipeline of this data source
    #[serde(default)]
    pub pause: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct XJoinDataSourceStatus {
    /// Version currently serving. Empty when none.
    #[serde(default)]
    pub active_version: String,
    /// Version being built to replace the active one. Empty when none.
    #[serde(default)]
    pub refreshing_version: String,
}
