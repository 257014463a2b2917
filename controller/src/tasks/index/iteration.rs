use crate::crds::XJoinIndex;
use crate::tasks::convergence::{converge, ConvergenceReport};
use crate::tasks::descriptor::{index_child, ChildKind, IndexParameters};
use crate::tasks::gateway::Gateway;
use crate::tasks::iteration::{desired_versions, Iteration};
use crate::tasks::labels::child_name;
use crate::tasks::types::Result;
use kube::ResourceExt;
use std::time::Duration;
use tracing::{info, instrument};

/// One reconcile or finalize pass over an `XJoinIndex`
pub struct IndexIteration<'a> {
    pub iteration: Iteration<'a, XJoinIndex>,
    pub parameters: IndexParameters,
}

impl<'a> IndexIteration<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        instance: XJoinIndex,
        operation_timeout: Duration,
    ) -> Self {
        let parameters = IndexParameters::from(&instance.spec);
        Self {
            iteration: Iteration::new(gateway, instance, operation_timeout),
            parameters,
        }
    }

    #[must_use]
    pub fn instance(&self) -> &XJoinIndex {
        &self.iteration.instance
    }

    async fn create_child(&self, kind: ChildKind, version: &str) -> Result<()> {
        let object = index_child(
            kind,
            &self.iteration.parent_name()?,
            &self.iteration.namespace()?,
            version,
            &self.parameters,
        );
        self.iteration.create_child(kind, &object).await
    }

    async fn delete_child(&self, kind: ChildKind, version: &str) -> Result<()> {
        let name = child_name(&self.iteration.parent_name()?, version);
        self.iteration.delete_child(kind, &name).await
    }

    pub async fn create_index_pipeline(&self, version: &str) -> Result<()> {
        self.create_child(ChildKind::IndexPipeline, version).await
    }

    pub async fn create_index_validator(&self, version: &str) -> Result<()> {
        self.create_child(ChildKind::IndexValidator, version).await
    }

    pub async fn delete_index_pipeline(&self, version: &str) -> Result<()> {
        self.delete_child(ChildKind::IndexPipeline, version).await
    }

    pub async fn delete_index_validator(&self, version: &str) -> Result<()> {
        self.delete_child(ChildKind::IndexValidator, version).await
    }

    async fn reconcile_kind(&self, kind: ChildKind) -> Result<ConvergenceReport> {
        let parent_name = self.iteration.parent_name()?;
        let namespace = self.iteration.namespace()?;
        let desired = desired_versions(self.instance());

        converge(&self.iteration, kind, &desired, |version| {
            index_child(kind, &parent_name, &namespace, version, &self.parameters)
        })
        .await
    }

    #[instrument(skip(self), fields(index = %self.instance().name_any()))]
    pub async fn reconcile_pipelines(&self) -> Result<ConvergenceReport> {
        self.reconcile_kind(ChildKind::IndexPipeline).await
    }

    #[instrument(skip(self), fields(index = %self.instance().name_any()))]
    pub async fn reconcile_validators(&self) -> Result<ConvergenceReport> {
        self.reconcile_kind(ChildKind::IndexValidator).await
    }

    /// Delete pipelines and validators for the active and refreshing versions,
    /// then release the finalizer.
    #[instrument(skip(self), fields(index = %self.instance().name_any()))]
    pub async fn finalize(&mut self) -> Result<()> {
        info!("Starting finalizer");

        for version in desired_versions(self.instance()) {
            self.delete_index_pipeline(&version).await?;
            self.delete_index_validator(&version).await?;
        }

        self.iteration.remove_finalizer().await?;

        info!("Successfully finalized");
        Ok(())
    }
}
