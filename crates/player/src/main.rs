use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use menuboard_content::source::HttpContentSource;
use menuboard_player::config::PlayerConfig;
use menuboard_player::controller::PlayerController;
use menuboard_player::router::build_app_router;
use menuboard_player::state::AppState;
use menuboard_player::sync::MenuSynchronizer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "menuboard_player=info,menuboard_content=info,menuboard_core=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match PlayerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        project_id = %config.project_id,
        dataset = %config.dataset,
        "Loaded player configuration",
    );

    // --- Menu synchronizer ---
    let source = Arc::new(HttpContentSource::new(config.content_config()));
    let sync = Arc::new(MenuSynchronizer::new(source, config.sync_config()));
    sync.start().await;

    // --- Screen controller ---
    let player = PlayerController::spawn(sync.subscribe(), config.controller_config());
    tracing::info!("Screen controller started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        sync: Arc::clone(&sync),
        player: player.clone(),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = match config.host.parse::<IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    player.shutdown().await;
    sync.shutdown().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
