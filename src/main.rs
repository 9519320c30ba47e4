//! Akitect Console - Workflow backend for the video story generator
//!
//! The console server:
//! - Runs one workflow session per browser tab as a state machine
//! - Streams drafts, stories and generation progress from the remote service
//! - Stores saved draft and story sets in SQLite
//! - Serves the console shell over REST and WebSocket

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "akitect_console=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Akitect Console");

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Remote service: {}", config.remote_base_url);
    tracing::info!("  Database: {}", config.database_url);
    let port = config.server_port;

    // Initialize application state
    let state = AppState::new(config).await?;
    let state = Arc::new(state);
    tracing::info!("Application state initialized");

    let sweeper = tokio::spawn(evict_idle_sessions(state.clone()));

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/sessions/{id}/ws",
            get(infrastructure::websocket::ws_handler),
        )
        // Merge REST API routes
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, closing sessions...");
        }
    }

    sweeper.abort();

    // Abort open streams of every session
    let mut sessions = state.sessions.write().await;
    let open = sessions.session_count();
    sessions.close_all();
    tracing::info!("{} sessions closed", open);

    Ok(())
}

/// Periodically close sessions that no shell has used for a while
async fn evict_idle_sessions(state: Arc<AppState>) {
    let timeout = state.config.session_idle_timeout();
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let mut sessions = state.sessions.write().await;
        let evicted = sessions.evict_idle(timeout);
        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                remaining = sessions.session_count(),
                "Idle sessions evicted"
            );
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
