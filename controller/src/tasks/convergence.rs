//! Version-set convergence over one child kind
//!
//! Observed children (found by ownership label) are compared against the
//! desired versions. A child satisfies a version only when it carries that
//! version under the canonical `parent.version` name; every other labelled
//! child is stale and deleted by its observed name while scanning. Missing
//! ones are created afterwards. Any gateway failure aborts the remaining
//! diff; the next invocation resumes from whatever state the cluster is in.

use crate::tasks::descriptor::{observed_version, ChildKind};
use crate::tasks::iteration::{Iteration, ParentResource};
use crate::tasks::labels::child_name;
use crate::tasks::types::Result;
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::{info, warn};

/// Changes applied by one convergence pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Names of children created
    pub created: Vec<String>,
    /// Names of children deleted
    pub deleted: Vec<String>,
}

impl ConvergenceReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }

    pub fn merge(&mut self, other: ConvergenceReport) {
        self.created.extend(other.created);
        self.deleted.extend(other.deleted);
    }
}

/// Drive children of `kind` toward `desired`, building missing ones with `build`.
pub async fn converge<K, F>(
    iteration: &Iteration<'_, K>,
    kind: ChildKind,
    desired: &[String],
    build: F,
) -> Result<ConvergenceReport>
where
    K: ParentResource,
    F: Fn(&str) -> DynamicObject + Send + Sync,
{
    let parent_name = iteration.parent_name()?;
    let mut report = ConvergenceReport::default();

    // found flag per desired version, flipped when a matching child is observed
    let mut expected: Vec<(&str, bool)> = desired.iter().map(|v| (v.as_str(), false)).collect();

    let observed = iteration.list_children(kind).await?;
    for child in &observed {
        let Some(version) = observed_version(child) else {
            let name = child.name_any();
            warn!(
                "{} {} has no readable spec.version, deleting it as stale",
                kind, name
            );
            iteration.delete_child(kind, &name).await?;
            report.deleted.push(name);
            continue;
        };

        let name = child.name_any();
        let canonical = child_name(&parent_name, version);
        match expected.iter_mut().find(|(v, _)| *v == version) {
            Some(entry) if name == canonical => entry.1 = true,
            Some(_) => {
                info!(
                    "{} {} carries version {} under a non-canonical name, deleting it",
                    kind, name, version
                );
                iteration.delete_child(kind, &name).await?;
                report.deleted.push(name);
            }
            None => {
                info!("{} version {} is no longer desired, deleting {}", kind, version, name);
                iteration.delete_child(kind, &name).await?;
                report.deleted.push(name);
            }
        }
    }

    for (version, found) in expected {
        if found {
            continue;
        }
        info!("expected {} version {} not found, creating it", kind, version);
        let object = build(version);
        iteration.create_child(kind, &object).await?;
        report.created.push(object.name_any());
    }

    Ok(report)
}
