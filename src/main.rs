//! `noonday-server` binary
//!
//! Serves the rules engine over HTTP and runs the phase poller that moves
//! timed matches forward when their sub-phase runs out. Settings come from
//! the environment (optionally seeded from a `.env` file):
//!
//! - `PORT` or `SERVER_ADDR`: listen address, default `0.0.0.0:8080`
//! - `LOG_LEVEL`: fallback filter when `RUST_LOG` is unset
//! - `PHASE_POLL_INTERVAL_MS`: how often expired phases are checked
//! - `RNG_SEED`: fixes role dealing and kill tie-breaks for replays

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noonday_server::app::AppState;
use noonday_server::config::Config;
use noonday_server::game::PhaseController;
use noonday_server::http::build_router;
use noonday_server::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    init_server_time();

    info!(
        addr = %config.server_addr,
        poll_ms = config.phase_poll_interval.as_millis() as u64,
        seeded = config.rng_seed.is_some(),
        "Starting Noonday rules server"
    );

    let state = AppState::new(config.clone());
    let poller = spawn_phase_poller(state.controller.clone(), config.phase_poll_interval);

    let listener = TcpListener::bind(config.server_addr).await?;
    info!("Listening on {}", config.server_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Matches left mid-phase stay where they are; nothing is persisted
    poller.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Run the auto-advance loop on its own task for the life of the server
fn spawn_phase_poller(controller: Arc<PhaseController>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(controller.run_auto_advance(every))
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, draining requests"),
        _ = terminate => info!("Received terminate signal, draining requests"),
    }
}
