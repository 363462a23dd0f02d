use anyhow::{Context, Result};
use axum::serve;
use clap::Parser;
use nomios_ingress::cli::{Cli, Commands};
use nomios_ingress::config::IngressConfig;
use nomios_ingress::{app_state, http::build_router};
use nomios_telemetry::{init_telemetry, shutdown_telemetry};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.telemetry())?;

    match cli.command {
        Commands::Server(args) => {
            let config = IngressConfig::from_args(&args)?;
            let router = build_router(app_state(&config)?);
            let listener = TcpListener::bind(config.addr)
                .await
                .with_context(|| format!("failed to bind {}", config.addr))?;
            info!(
                addr = %config.addr,
                trigger_manager = %config.trigger_manager,
                dry_run = config.dry_run,
                "nomios listening"
            );

            serve(listener, router)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                })
                .await?;
        }
    }
    shutdown_telemetry();
    Ok(())
}
