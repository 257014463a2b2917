//! Pipeline Controller Configuration
//!
//! Deadlines and requeue intervals for the data-source and index controllers.
//! Loaded from a mounted YAML file; every field has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main controller configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Gateway call configuration
    #[serde(default)]
    pub operation: OperationConfig,

    /// Requeue configuration
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Gateway call configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperationConfig {
    /// Deadline applied to every create/delete/list/update call
    #[serde(default = "default_timeout_seconds", rename = "timeoutSeconds")]
    pub timeout_seconds: u64,
}

/// Requeue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Delay before a converged parent is reconciled again
    #[serde(default = "default_resync_seconds", rename = "resyncSeconds")]
    pub resync_seconds: u64,

    /// Delay before a failed reconcile or finalize is retried
    #[serde(
        default = "default_error_requeue_seconds",
        rename = "errorRequeueSeconds"
    )]
    pub error_requeue_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_resync_seconds() -> u64 {
    300
}

fn default_error_requeue_seconds() -> u64 {
    30
}

impl Default for OperationConfig {
    fn default() -> Self {
        OperationConfig {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            resync_seconds: default_resync_seconds(),
            error_requeue_seconds: default_error_requeue_seconds(),
        }
    }
}

impl ControllerConfig {
    /// Validate that configuration has required fields
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.operation.timeout_seconds == 0 {
            return Err(anyhow::anyhow!(
                "operation.timeoutSeconds must be greater than zero"
            ));
        }
        if self.reconcile.resync_seconds == 0 {
            return Err(anyhow::anyhow!(
                "reconcile.resyncSeconds must be greater than zero"
            ));
        }
        if self.reconcile.error_requeue_seconds == 0 {
            return Err(anyhow::anyhow!(
                "reconcile.errorRequeueSeconds must be greater than zero"
            ));
        }
        Ok(())
    }

    /// Load configuration from mounted `ConfigMap` file
    pub fn from_mounted_file(config_path: &str) -> Result<Self, anyhow::Error> {
        let config_str = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {config_path}: {e}"))?;

        let config: ControllerConfig = serde_yaml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {e}"))?;

        Ok(config)
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation.timeout_seconds)
    }

    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile.resync_seconds)
    }

    #[must_use]
    pub fn error_requeue_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile.error_requeue_seconds)
    }
}
