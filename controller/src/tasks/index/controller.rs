use super::iteration::IndexIteration;
use crate::crds::XJoinIndex;
use crate::tasks::iteration::{parent_phase, ParentPhase};
use crate::tasks::types::{Context, Error, Result};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

#[instrument(skip(ctx), fields(index = %index.name_any(), namespace = %ctx.namespace))]
pub async fn reconcile_index(index: Arc<XJoinIndex>, ctx: Arc<Context>) -> Result<Action> {
    debug!("Reconciling XJoinIndex: {}", index.name_any());

    let mut iteration = IndexIteration::new(
        ctx.gateway.as_ref(),
        (*index).clone(),
        ctx.config.operation_timeout(),
    );

    match parent_phase(index.as_ref()) {
        ParentPhase::Finalizing => {
            iteration.finalize().await?;
            Ok(Action::await_change())
        }
        ParentPhase::Released => Ok(Action::await_change()),
        ParentPhase::Unclaimed => {
            info!("Adding finalizer to XJoinIndex {}", index.name_any());
            iteration.iteration.add_finalizer().await?;
            Ok(Action::await_change())
        }
        ParentPhase::Active => {
            let mut report = iteration.reconcile_pipelines().await?;
            report.merge(iteration.reconcile_validators().await?);
            if !report.is_noop() {
                info!(
                    created = ?report.created,
                    deleted = ?report.deleted,
                    "Index children reconciled"
                );
            }
            Ok(Action::requeue(ctx.config.resync_interval()))
        }
    }
}

/// Error policy for the XJoinIndex controller: retry the whole pass later
#[instrument(skip(ctx), fields(index = %index.name_any(), namespace = %ctx.namespace))]
pub fn error_policy_index(index: Arc<XJoinIndex>, err: &Error, ctx: Arc<Context>) -> Action {
    error!(
        error = %err,
        index = %index.name_any(),
        "XJoinIndex reconciliation failed, requeueing"
    );
    Action::requeue(ctx.config.error_requeue_interval())
}
