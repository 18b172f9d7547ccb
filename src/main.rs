//! T2D Pulse — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, middleware,
//! the Prometheus recorder and the background mood watcher.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use t2d_pulse::api::{self, AppState};
use t2d_pulse::config::AppConfig;
use t2d_pulse::metrics::Metrics;
use t2d_pulse::notify::NotifierMux;
use t2d_pulse::watch::spawn_mood_watch;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("t2d_pulse=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::load().context("loading pulse config")?;
    let metrics = Metrics::init();

    let state = AppState::from_config(&config).context("building app state")?;

    spawn_mood_watch(
        state.board.clone(),
        config.watch_interval_secs,
        NotifierMux::from_env(),
    );

    let router = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(bind = %config.bind, "t2d-pulse listening");

    axum::serve(listener, router)
        .await
        .context("serving http")?;
    Ok(())
}
