//! Routing engine initialization
//!
//! Converts server configuration into an SDK builder call. The builder
//! opens the repository and bootstraps the default counsellor.

use crate::config::ServerConfig;
use anyhow::Result;
use leadroute_sdk::{ReassignmentSweep, RoutingEngine, RoutingEngineBuilder};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Initialize the routing engine
pub async fn init_engine(config: &ServerConfig) -> Result<RoutingEngine> {
    let repo_config = config.repository.to_repository_config()?;

    let engine = RoutingEngineBuilder::new()
        .with_config(config.engine.clone())
        .with_repository_config(repo_config)
        .build()
        .await?;

    Ok(engine)
}

/// Start the periodic reassignment sweep when enabled
pub fn start_sweep(
    config: &ServerConfig,
    sweep: Arc<ReassignmentSweep>,
) -> Option<JoinHandle<()>> {
    if !config.enable_sweep {
        info!("Reassignment sweep disabled");
        return None;
    }
    Some(sweep.spawn(config.engine.sweep.interval()))
}
