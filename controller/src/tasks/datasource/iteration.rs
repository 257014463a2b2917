use crate::crds::XJoinDataSource;
use crate::tasks::convergence::{converge, ConvergenceReport};
use crate::tasks::descriptor::{data_source_pipeline, ChildKind, DataSourceParameters};
use crate::tasks::gateway::Gateway;
use crate::tasks::iteration::{desired_versions, Iteration, ParentResource};
use crate::tasks::labels::child_name;
use crate::tasks::types::Result;
use kube::ResourceExt;
use std::time::Duration;
use tracing::{info, instrument};

/// One reconcile or finalize pass over an `XJoinDataSource`
pub struct DataSourceIteration<'a> {
    pub iteration: Iteration<'a, XJoinDataSource>,
    pub parameters: DataSourceParameters,
}

impl<'a> DataSourceIteration<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        instance: XJoinDataSource,
        operation_timeout: Duration,
    ) -> Self {
        let parameters = DataSourceParameters::from(&instance.spec);
        Self {
            iteration: Iteration::new(gateway, instance, operation_timeout),
            parameters,
        }
    }

    #[must_use]
    pub fn instance(&self) -> &XJoinDataSource {
        &self.iteration.instance
    }

    pub async fn create_data_source_pipeline(&self, version: &str) -> Result<()> {
        let object = data_source_pipeline(
            &self.iteration.parent_name()?,
            &self.iteration.namespace()?,
            version,
            &self.parameters,
        );
        self.iteration
            .create_child(ChildKind::DataSourcePipeline, &object)
            .await
    }

    pub async fn delete_data_source_pipeline(&self, version: &str) -> Result<()> {
        let name = child_name(&self.iteration.parent_name()?, version);
        self.iteration
            .delete_child(ChildKind::DataSourcePipeline, &name)
            .await
    }

    /// Make the labelled pipelines match exactly the active and refreshing versions.
    #[instrument(skip(self), fields(data_source = %self.instance().name_any()))]
    pub async fn reconcile_pipelines(&self) -> Result<ConvergenceReport> {
        let parent_name = self.iteration.parent_name()?;
        let namespace = self.iteration.namespace()?;
        let desired = desired_versions(self.instance());

        converge(
            &self.iteration,
            ChildKind::DataSourcePipeline,
            &desired,
            |version| data_source_pipeline(&parent_name, &namespace, version, &self.parameters),
        )
        .await
    }

    /// Delete the active and refreshing pipelines, then release the finalizer.
    #[instrument(skip(self), fields(data_source = %self.instance().name_any()))]
    pub async fn finalize(&mut self) -> Result<()> {
        info!("Starting finalizer");

        let active = self.instance().active_version().to_string();
        if !active.is_empty() {
            self.delete_data_source_pipeline(&active).await?;
        }
        let refreshing = self.instance().refreshing_version().to_string();
        if !refreshing.is_empty() {
            self.delete_data_source_pipeline(&refreshing).await?;
        }

        self.iteration.remove_finalizer().await?;

        info!("Successfully finalized");
        Ok(())
    }
}
