/*
 * 5D Labs Agent Platform - Pipeline Controller Service
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Pipeline Controller Service - Kubernetes Controller for `XJoinDataSource` and `XJoinIndex` CRDs
//!
//! This service:
//! - Watches `XJoinDataSource` and `XJoinIndex` custom resources
//! - Creates and deletes versioned pipeline children to match the parent status
//! - Removes children before releasing a parent's finalizer

use pipeline_controller::tasks::{load_config, run_pipeline_controller};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,pipeline_controller=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!(
        "Starting Pipeline Controller Service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let namespace = std::env::var("WATCH_NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let config_path =
        std::env::var("CONTROLLER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    tokio::select! {
        result = run_pipeline_controller(client, namespace, config) => {
            if let Err(e) = result {
                error!("Controller error: {}", e);
                return Err(e.into());
            }
        }
        () = shutdown_signal() => {}
    }

    info!("Pipeline Controller Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
