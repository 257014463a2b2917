//! Ownership label and child naming helpers

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Label that stores the name of the owning parent on every child
pub const LABEL_COMPONENT_NAME: &str = "xjoin.component.name";

/// Name of the child realising `version` of `parent_name`.
#[must_use]
pub fn child_name(parent_name: &str, version: &str) -> String {
    format!("{parent_name}.{version}")
}

/// Label selector matching every child owned by `parent_name`.
#[must_use]
pub fn component_selector(parent_name: &str) -> String {
    format!("{LABEL_COMPONENT_NAME}={parent_name}")
}

/// Returns the owning parent name recorded on a child, if any.
#[must_use]
pub fn component_name(meta: &ObjectMeta) -> Option<&str> {
    meta.labels
        .as_ref()
        .and_then(|labels| labels.get(LABEL_COMPONENT_NAME))
        .map(String::as_str)
}
