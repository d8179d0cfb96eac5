//! Lead routing HTTP server
//!
//! Provides REST API for routing leads and running the reassignment sweep.

use anyhow::Result;
use leadroute_sdk::ReassignmentSweep;
use leadroute_server::api;
use leadroute_server::config::ServerConfig;
use leadroute_server::engine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load()?;
    init_tracing(&config)?;

    info!("Loaded configuration: {:?}", config);

    let engine = Arc::new(engine::init_engine(&config).await?);
    info!("Routing engine initialized");

    let sweep = Arc::new(ReassignmentSweep::new(engine.clone()));
    let _sweep_task = engine::start_sweep(&config, sweep.clone());

    let app = api::rest::create_router(engine, sweep);

    let addr = config.bind_address();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Route lead: POST http://{}/v1/leads/route", addr);
    info!("  Route L3: POST http://{}/v1/l3/route", addr);
    info!("  Metrics: http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &ServerConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
