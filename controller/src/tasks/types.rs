use crate::tasks::config::ControllerConfig;
use crate::tasks::gateway::Gateway;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Finalizer that blocks `XJoinDataSource` removal until its pipelines are gone
pub const DATA_SOURCE_FINALIZER_NAME: &str = "finalizer.xjoin.datasource.cloud.redhat.com";
/// Finalizer that blocks `XJoinIndex` removal until its children are gone
pub const INDEX_FINALIZER_NAME: &str = "finalizer.xjoin.index.cloud.redhat.com";

/// Failure reported by a [`Gateway`] call.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: String, name: String },

    #[error("update of {name} rejected: stored object changed since it was read")]
    Conflict { name: String },

    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    /// A gateway call failed. `context` names the call site, `source` keeps the kind.
    #[error("{context}: {source}")]
    Gateway {
        context: String,
        #[source]
        source: GatewayError,
    },

    #[error("Missing object key")]
    MissingObjectKey,

    #[error("Object {0} has no namespace")]
    MissingNamespace(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    pub fn gateway(context: impl Into<String>, source: GatewayError) -> Self {
        Self::Gateway {
            context: context.into(),
            source,
        }
    }

    /// The underlying gateway failure, if this error came from one.
    #[must_use]
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Shared state handed to every reconcile invocation
#[derive(Clone)]
pub struct Context {
    pub gateway: Arc<dyn Gateway>,
    pub namespace: String,
    pub config: Arc<ControllerConfig>,
}
