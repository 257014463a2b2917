//! `XJoinIndex` Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(group = "xjoin.cloud.redhat.com", version = "v1alpha1", kind = "XJoinIndex")]
#[kube(namespaced)]
#[kube(status = "XJoinIndexStatus")]
#[kube(printcolumn = r#"{"name":"Active","type":"string","jsonPath":".status.activeVersion"}"#)]
#[kube(
    printcolumn = r#"{"name":"Refreshing","type":"string","jsonPath":".status.refreshingVersion"}"#
)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
#[serde(rename_all = "camelCase")]
pub struct XJoinIndexSpec {
    #[serde(default)]
    pub avro_schema: String,
    #[serde(default)]
    pub pause: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct XJoinIndexStatus {
    #[serde(default)]
    pub active_version: String,
    #[serde(default)]
    pub refreshing_version: String,
}
