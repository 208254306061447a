use crate::use_cases::{GameEvent, Screen, SessionState};
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from presenters into the game task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Serialized frames, shared across all connections.
    pub frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized frame for lag recovery and late joiners.
    pub frame_latest_tx: watch::Sender<Utf8Bytes>,
    // Screen currently requested by the game.
    pub screen_tx: watch::Sender<Screen>,
    // Session lifecycle (idle/running/ended).
    pub session_tx: watch::Sender<SessionState>,
}
