// Framework bootstrap for the tank game runtime.

use crate::domain::{Level, Tuning};
use crate::frameworks::config;
use crate::interface_adapters::SpriteTableView;
use crate::interface_adapters::net::{frame_serializer, health_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Frame, GameDriver, Screen, SessionState, game_task};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let shutdown = Arc::new(Notify::new());
    let state = build_state(shutdown.clone()).await?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    // Stop the game task between ticks once the listener is done.
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn load_level(tuning: &Tuning) -> Result<Level> {
    let level = match config::level_path() {
        Some(path) => {
            let source = tokio::fs::read_to_string(&path).await.inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to read level file");
            })?;
            let level = Level::from_toml_str(&source).map_err(std::io::Error::other)?;
            tracing::info!(path = %path.display(), "loaded level file");
            level
        }
        None => Level::builtin().map_err(std::io::Error::other)?,
    };

    // An invalid level is reported again on every start attempt; serve anyway.
    if let Err(e) = level.validate(tuning) {
        tracing::warn!(error = %e, "level failed validation");
    }

    Ok(level)
}

async fn build_state(shutdown: Arc<Notify>) -> Result<Arc<AppState>> {
    let tuning = Tuning::default();
    let level = Arc::new(load_level(&tuning).await?);
    let tick_interval = config::tick_interval();

    let (input_tx, input_rx) = mpsc::channel(config::INPUT_CHANNEL_CAPACITY);
    let (frame_tx, frame_rx) = broadcast::channel::<Frame>(config::FRAME_BROADCAST_CAPACITY);
    let (frame_bytes_tx, _frame_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::FRAME_BROADCAST_CAPACITY);
    let (frame_latest_tx, _frame_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    let (screen_tx, _screen_rx) = watch::channel(Screen::Start);
    let (session_tx, _session_rx) = watch::channel(SessionState::Idle);

    // Serialize frames once for every connected presenter.
    tokio::spawn(frame_serializer(
        frame_rx,
        frame_bytes_tx.clone(),
        frame_latest_tx.clone(),
    ));

    let view = SpriteTableView::new(frame_tx, screen_tx.clone());
    let driver = GameDriver::new(view, tuning);
    tracing::debug!(
        tick_interval_ms = tick_interval.as_millis(),
        walls = level.walls.len(),
        ai_tanks = level.ai_tanks.len(),
        "game task configured"
    );

    // The single authoritative simulation task.
    tokio::spawn(game_task(
        driver,
        level,
        input_rx,
        session_tx.clone(),
        tick_interval,
        shutdown,
    ));

    Ok(Arc::new(AppState {
        input_tx,
        frame_bytes_tx,
        frame_latest_tx,
        screen_tx,
        session_tx,
    }))
}
