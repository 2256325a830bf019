use std::time::Duration;

use anyhow::Context;
use db::DBService;
use server::{AppState, file_logging, routes};
use services::services::config::Config;
use utils::build_info::BUILD_INFO;

const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    // The guard must outlive the server so buffered file logs are flushed
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    let config = Config::from_env().context("invalid configuration")?;
    let addr = config.bind_addr()?;

    let db = DBService::open(&config.database_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_path.display()))?;

    let state = AppState::new(db.clone(), config)?;

    let chatbot = state.chatbot.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            chatbot.prune_rate_limits();
        }
    });

    let app_router = routes::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        version = BUILD_INFO.version,
        git_commit = BUILD_INFO.git_commit,
        "Server running on http://{local_addr}"
    );

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    db.close().await;

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
