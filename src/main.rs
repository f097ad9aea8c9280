use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use affapp_backend::config::{Config, SessionBackend};
use affapp_backend::create_app;
use affapp_backend::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("affapp_backend=debug,tower_http=debug")),
        )
        .init();

    info!("Starting server...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server setup failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let (config, loaded_path) = Config::resolve().context("configuration is incomplete")?;
    match loaded_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No config file found, using defaults and environment"),
    }

    let system_config = &config.system_config;
    for dir in [&system_config.intro_dir, &system_config.outro_dir] {
        if !std::path::Path::new(dir).is_dir() {
            tracing::warn!("Audio directory {} does not exist; webhook requests will fail", dir);
        }
    }
    if let SessionBackend::File(dir) = config.session_config.backend()? {
        info!("Sessions stored in {}", dir.display());
    }

    let app_state = AppState::new(config.clone()).await?;
    let app = create_app(app_state);

    let bind_addr = (config.system_config.host.as_str(), config.system_config.port);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}:{}", bind_addr.0, bind_addr.1))?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
