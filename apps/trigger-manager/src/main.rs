use std::sync::Arc;

use anyhow::{Context, Result};
use axum::serve;
use nomios_telemetry::{install as init_telemetry, shutdown_telemetry};
use nomios_trigger_manager::config::TriggerManagerConfig;
use nomios_trigger_manager::http::build_router;
use nomios_triggers::{CodefreshPipelineRunner, open_store};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry("trigger-manager")?;

    let config = TriggerManagerConfig::from_env()?;
    let runner = CodefreshPipelineRunner::new(
        config.codefresh_url.as_str(),
        config.codefresh_token.as_str(),
    )?;
    let store = open_store(&config.store, Arc::new(runner))
        .await
        .context("failed to open trigger store")?;

    let router = build_router(store);
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!(
        addr = %config.addr,
        codefresh = %config.codefresh_url,
        redis = config.store.redis_url.is_some(),
        merge = ?config.store.merge,
        "trigger-manager listening"
    );

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    shutdown_telemetry();
    Ok(())
}
