use crate::crds::{XJoinDataSource, XJoinIndex};
use futures::StreamExt;
use kube::api::{DynamicObject, ListParams};
use kube::runtime::controller::Controller;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config;
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, Instrument};

pub mod config;
pub mod convergence;
pub mod datasource;
pub mod descriptor;
pub mod gateway;
pub mod index;
pub mod iteration;
pub mod labels;
pub mod types;

// Re-export commonly used items
pub use config::ControllerConfig;
pub use datasource::reconcile_data_source;
pub use gateway::{Gateway, KubeGateway};
pub use index::reconcile_index;
pub use types::{Context, Error, GatewayError, Result};

use datasource::error_policy_data_source;
use descriptor::ChildKind;
use index::error_policy_index;

/// Load the controller configuration, falling back to defaults when the file is unavailable
pub fn load_config(config_path: &str) -> Result<ControllerConfig> {
    let config = match ControllerConfig::from_mounted_file(config_path) {
        Ok(cfg) => {
            debug!("Successfully loaded controller configuration");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration, using defaults: {}", e);
            ControllerConfig::default()
        }
    };

    if let Err(validation_error) = config.validate() {
        error!("Configuration validation failed: {}", validation_error);
        return Err(Error::ConfigError(validation_error.to_string()));
    }
    debug!("Configuration validation passed");
    Ok(config)
}

/// Main entry point for the data-source and index controllers
#[instrument(skip(client, config), fields(namespace = %namespace))]
pub async fn run_pipeline_controller(
    client: Client,
    namespace: String,
    config: ControllerConfig,
) -> Result<()> {
    info!("Starting pipeline controllers in namespace: {}", namespace);

    let context = Arc::new(Context {
        gateway: Arc::new(KubeGateway::new(client.clone())),
        namespace: namespace.clone(),
        config: Arc::new(config),
    });

    log_existing::<XJoinDataSource>(&client, &namespace).await;
    log_existing::<XJoinIndex>(&client, &namespace).await;

    let data_source_handle = tokio::spawn({
        let context = context.clone();
        let client = client.clone();
        let namespace = namespace.clone();
        async move { run_data_source_controller(client, namespace, context).await }
    });

    let index_handle = tokio::spawn({
        let context = context.clone();
        let client = client.clone();
        let namespace = namespace.clone();
        async move { run_index_controller(client, namespace, context).await }
    });

    match tokio::try_join!(data_source_handle, index_handle) {
        Ok((data_source_result, index_result)) => {
            if let Err(e) = data_source_result {
                error!("XJoinDataSource controller failed: {:?}", e);
            }
            if let Err(e) = index_result {
                error!("XJoinIndex controller failed: {:?}", e);
            }
        }
        Err(e) => {
            error!("Controller task join error: {:?}", e);
        }
    }

    info!("Pipeline controller shutting down");
    Ok(())
}

/// Startup visibility: list the parents this controller is about to observe
async fn log_existing<K>(client: &Client, namespace: &str)
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    match api.list(&ListParams::default()).await {
        Ok(list) => {
            info!(
                "Controller startup: found {} {}(s) in namespace {}",
                list.items.len(),
                K::kind(&()),
                namespace
            );
            for parent in list.items {
                debug!("Existing {}: name={}", K::kind(&()), parent.name_any());
            }
        }
        Err(e) => {
            error!("Failed to list {} at startup: {}", K::kind(&()), e);
        }
    }
}

/// Map a labelled child back to the parent named in its ownership label
fn parent_of<K>(child: DynamicObject) -> Option<ObjectRef<K>>
where
    K: Resource<DynamicType = ()>,
{
    let parent = labels::component_name(&child.metadata)?;
    let namespace = child.namespace()?;
    Some(ObjectRef::new(parent).within(&namespace))
}

fn children_api(client: &Client, namespace: &str, kind: ChildKind) -> Api<DynamicObject> {
    Api::namespaced_with(client.clone(), namespace, &kind.api_resource())
}

/// Run the XJoinDataSource controller
#[instrument(skip(client, context), fields(namespace = %namespace))]
async fn run_data_source_controller(
    client: Client,
    namespace: String,
    context: Arc<Context>,
) -> Result<()> {
    info!("Starting XJoinDataSource controller");

    let data_sources: Api<XJoinDataSource> = Api::namespaced(client.clone(), &namespace);
    let watcher_config = Config::default().any_semantic();
    let kind = ChildKind::DataSourcePipeline;

    Controller::new(data_sources, watcher_config.clone())
        .watches_with(
            children_api(&client, &namespace, kind),
            kind.api_resource(),
            watcher_config,
            parent_of::<XJoinDataSource>,
        )
        .run(reconcile_data_source, error_policy_data_source, context)
        .for_each(|reconciliation_result| {
            let span = tracing::info_span!("data_source_reconciliation_result");
            async move {
                match reconciliation_result {
                    Ok(resource) => {
                        debug!(resource = ?resource, "XJoinDataSource reconciliation successful");
                    }
                    Err(reconciliation_err) => {
                        error!(error = ?reconciliation_err, "XJoinDataSource reconciliation error");
                    }
                }
            }
            .instrument(span)
        })
        .await;

    info!("XJoinDataSource controller shutting down");
    Ok(())
}

/// Run the XJoinIndex controller
#[instrument(skip(client, context), fields(namespace = %namespace))]
async fn run_index_controller(
    client: Client,
    namespace: String,
    context: Arc<Context>,
) -> Result<()> {
    info!("Starting XJoinIndex controller");

    let indexes: Api<XJoinIndex> = Api::namespaced(client.clone(), &namespace);
    let watcher_config = Config::default().any_semantic();

    let mut controller = Controller::new(indexes, watcher_config.clone());
    for kind in [ChildKind::IndexPipeline, ChildKind::IndexValidator] {
        controller = controller.watches_with(
            children_api(&client, &namespace, kind),
            kind.api_resource(),
            watcher_config.clone(),
            parent_of::<XJoinIndex>,
        );
    }

    controller
        .run(reconcile_index, error_policy_index, context)
        .for_each(|reconciliation_result| {
            let span = tracing::info_span!("index_reconciliation_result");
            async move {
                match reconciliation_result {
                    Ok(resource) => {
                        debug!(resource = ?resource, "XJoinIndex reconciliation successful");
                    }
                    Err(reconciliation_err) => {
                        error!(error = ?reconciliation_err, "XJoinIndex reconciliation error");
                    }
                }
            }
            .instrument(span)
        })
        .await;

    info!("XJoinIndex controller shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::descriptor::{data_source_pipeline, DataSourceParameters};

    #[test]
    fn labelled_child_maps_to_parent() {
        let child = data_source_pipeline("ds1", "test", "1.0", &DataSourceParameters::default());
        let parent = parent_of::<XJoinDataSource>(child).unwrap();
        assert_eq!(parent.name, "ds1");
        assert_eq!(parent.namespace.as_deref(), Some("test"));
    }

    #[test]
    fn unlabelled_child_maps_to_nothing() {
        let mut child =
            data_source_pipeline("ds1", "test", "1.0", &DataSourceParameters::default());
        child.metadata.labels = None;
        assert!(parent_of::<XJoinDataSource>(child).is_none());
    }

    #[test]
    fn load_config_falls_back_to_defaults() {
        let config = load_config("/nonexistent/config.yaml").unwrap();
        assert_eq!(config.operation.timeout_seconds, 10);
    }

    #[test]
    fn load_config_rejects_invalid_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "reconcile:\n  resyncSeconds: 0").unwrap();
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
