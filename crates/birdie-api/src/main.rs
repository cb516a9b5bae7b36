//! Birdie entry point.
//!
//! Binary name: `birdie`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then either
//! starts the webhook server or runs the environment check.

mod cli;
mod http;
mod state;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use birdie_infra::config::{CONFIG_FILE, apply_env_overrides, load_config};
use birdie_infra::media::ffmpeg::check_ffmpeg_available;
use birdie_infra::secret::env::EnvSecrets;
use birdie_infra::sqlite::pool::data_dir;
use birdie_observe::tracing_setup::{LogFormat, default_directive, init_tracing, shutdown_tracing};
use birdie_types::config::AppConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, default_directive(cli.verbose), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir().join(CONFIG_FILE));
    let mut config = load_config(&config_path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    let result = match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config).await
        }
        Commands::Check => check(&config, &config_path).await,
    };

    shutdown_tracing();
    result
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let secrets = EnvSecrets::from_env()?;
    if config.drive.root_folder_id.is_empty() {
        tracing::warn!("drive.root_folder_id is empty; user folders will be created at the drive root");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    let state = AppState::init(config, secrets).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "birdie webhook server listening");

    let router = http::router::build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.drain(grace).await;
    tracing::info!("server stopped");
    Ok(())
}

async fn check(config: &AppConfig, config_path: &Path) -> anyhow::Result<()> {
    println!("config: {}", config_path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    match check_ffmpeg_available("ffmpeg").await {
        Ok(version) => println!("ffmpeg: {version}"),
        Err(e) => anyhow::bail!("ffmpeg check failed: {e}"),
    }

    match EnvSecrets::from_env() {
        Ok(_) => println!("credentials: ok"),
        Err(e) => println!("credentials: {e}"),
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
