//! Doorlist HTTP server.
//!
//! Registration and check-in engine behind an Axum API, with in-memory
//! collaborators and optional demo seed data.

use doorlist_core::environment::SystemClock;
use doorlist_engine::config::Config;
use doorlist_engine::server::{build_router, AppState};
use doorlist_engine::types::{Capacity, EventStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first: the log filter default lives there
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Doorlist server");

    let state = AppState::new(Arc::new(SystemClock));

    if config.seed.demo_data {
        seed_demo_data(&state).await;
    }

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain per-event ledger stores before exiting
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    if let Err(error) = state.engine.shutdown(timeout).await {
        warn!(%error, "some ledger effects did not drain before the timeout");
    }

    info!("Server stopped");
    Ok(())
}

/// Seed one active demo event and a couple of attendees.
///
/// The generated ids are logged so a demo session can register and check
/// in immediately with curl.
async fn seed_demo_data(state: &AppState) {
    let Some(capacity) = Capacity::new(50) else {
        return;
    };
    let event_id = state
        .catalog
        .add("Doorlist Demo Night".to_string(), capacity, EventStatus::Active)
        .await;

    let ada = state
        .registry
        .add("Ada Lovelace".to_string(), "ada@example.com".to_string())
        .await;
    let grace = state
        .registry
        .add("Grace Hopper".to_string(), "grace@example.com".to_string())
        .await;

    info!(
        %event_id,
        ada = %ada.id,
        grace = %grace.id,
        "demo data seeded"
    );
}

/// Graceful shutdown signal handler: Ctrl+C or SIGTERM.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
