use super::iteration::DataSourceIteration;
use crate::crds::XJoinDataSource;
use crate::tasks::iteration::{parent_phase, ParentPhase};
use crate::tasks::types::{Context, Error, Result};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

#[instrument(skip(ctx), fields(data_source = %data_source.name_any(), namespace = %ctx.namespace))]
pub async fn reconcile_data_source(
    data_source: Arc<XJoinDataSource>,
    ctx: Arc<Context>,
) -> Result<Action> {
    debug!("Reconciling XJoinDataSource: {}", data_source.name_any());

    let mut iteration = DataSourceIteration::new(
        ctx.gateway.as_ref(),
        (*data_source).clone(),
        ctx.config.operation_timeout(),
    );

    match parent_phase(data_source.as_ref()) {
        ParentPhase::Finalizing => {
            iteration.finalize().await?;
            Ok(Action::await_change())
        }
        ParentPhase::Released => {
            debug!("Deletion in progress and finalizer already released");
            Ok(Action::await_change())
        }
        ParentPhase::Unclaimed => {
            info!("Adding finalizer to XJoinDataSource {}", data_source.name_any());
            iteration.iteration.add_finalizer().await?;
            Ok(Action::await_change())
        }
        ParentPhase::Active => {
            let report = iteration.reconcile_pipelines().await?;
            if report.is_noop() {
                debug!("Pipelines already converged");
            } else {
                info!(
                    created = ?report.created,
                    deleted = ?report.deleted,
                    "Pipelines reconciled"
                );
            }
            Ok(Action::requeue(ctx.config.resync_interval()))
        }
    }
}

/// Error policy for the XJoinDataSource controller: retry the whole pass later
#[instrument(skip(ctx), fields(data_source = %data_source.name_any(), namespace = %ctx.namespace))]
pub fn error_policy_data_source(
    data_source: Arc<XJoinDataSource>,
    err: &Error,
    ctx: Arc<Context>,
) -> Action {
    error!(
        error = %err,
        data_source = %data_source.name_any(),
        "XJoinDataSource reconciliation failed, requeueing"
    );
    Action::requeue(ctx.config.error_requeue_interval())
}
