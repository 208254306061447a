use crate::domain::PlayerInput;
use crate::interface_adapters::protocol::{
    ClientMessage,
    FrameDto,
    ScreenDto,
    ServerMessage,
    SessionDto,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Frame, GameEvent, Screen, SessionState};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    Ws(axum::Error),
    Serialization(serde_json::Error),
    InputClosed,
    FramesClosed,
    ScreenClosed,
    SessionClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::Serialization(e) => write!(f, "failed to serialize message: {e}"),
            NetError::InputClosed => write!(f, "game input channel closed"),
            NetError::FramesClosed => write!(f, "frame channel closed"),
            NetError::ScreenClosed => write!(f, "screen channel closed"),
            NetError::SessionClosed => write!(f, "session channel closed"),
        }
    }
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

pub async fn frame_serializer(
    mut frame_rx: broadcast::Receiver<Frame>,
    frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    frame_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each frame once and broadcast the shared bytes.
    loop {
        match frame_rx.recv().await {
            Ok(frame) => {
                let msg = ServerMessage::Frame(FrameDto::from(frame));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = %e, "failed to serialize frame");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Keep the latest frame for lag recovery even with no subscribers.
                frame_latest_tx.send_replace(bytes.clone());
                let _ = frame_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "frame serializer lagged; skipping to latest frame");
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("frame channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Connection id for correlating every log line of one presenter.
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    serve_connection(socket, state)
        .instrument(info_span!("conn", conn_id))
        .await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    info!("presenter connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = %e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    socket.send(Message::Text(txt.into())).await?;
    Ok(())
}

struct ConnCtx {
    pub input_tx: mpsc::Sender<GameEvent>,
    pub frame_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub frame_latest_rx: watch::Receiver<Utf8Bytes>,
    pub screen_rx: watch::Receiver<Screen>,
    pub session_rx: watch::Receiver<SessionState>,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_frame_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so nothing published in between is missed.
    let frame_bytes_rx = state.frame_bytes_tx.subscribe();
    let frame_latest_rx = state.frame_latest_tx.subscribe();
    let mut screen_rx = state.screen_tx.subscribe();
    let mut session_rx = state.session_tx.subscribe();

    // Clone out of the borrow; the guard must not live across an await.
    let session = session_rx.borrow_and_update().clone();
    send_message(socket, &ServerMessage::Session(SessionDto::from(session))).await?;

    let screen = *screen_rx.borrow_and_update();
    send_message(socket, &ServerMessage::Screen(ScreenDto::from(screen))).await?;

    // Late joiners get the last frame so they can draw before the next tick.
    let latest = frame_latest_rx.borrow().clone();
    if !latest.is_empty() {
        socket.send(Message::Text(latest)).await?;
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        input_tx: state.input_tx.clone(),
        frame_bytes_rx,
        frame_latest_rx,
        screen_rx,
        session_rx,

        invalid_json: 0,

        last_input_full_log: now,
        last_frame_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

fn forward_command(
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(TrySendError::Full(event)) => {
            if should_log(last_input_full_log) {
                warn!(?event, "input channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(TrySendError::Closed(_event)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        frame_bytes_rx,
        frame_latest_rx,
        screen_rx,
        session_rx,
        invalid_json,
        last_input_full_log,
        last_frame_lag_log,
        last_invalid_input_log,
        close_frame,
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    input_tx,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame_msg = frame_bytes_rx.recv() => {
                match frame_msg {
                    Ok(bytes) => match forward_bytes(bytes, socket).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_frame_lag_log) {
                            warn!(missed = n, "frames lagged; sending latest frame");
                        }

                        // Frames are full snapshots, so the latest one resyncs the presenter.
                        let latest = frame_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            match forward_bytes(latest, socket).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }

            changed = screen_rx.changed() => {
                match changed {
                    Ok(()) => {
                        let screen = *screen_rx.borrow_and_update();
                        let msg = ServerMessage::Screen(ScreenDto::from(screen));
                        match forward_message(&msg, socket).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Err(_) => {
                        fatal = Some(NetError::ScreenClosed);
                        true
                    }
                }
            }

            changed = session_rx.changed() => {
                match changed {
                    Ok(()) => {
                        let session = session_rx.borrow_and_update().clone();
                        let msg = ServerMessage::Session(SessionDto::from(session));
                        match forward_message(&msg, socket).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Err(_) => {
                        fatal = Some(NetError::SessionClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(e) = socket.close().await {
                debug!(error = %e, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(input_tx, *invalid_json).await {
        warn!(error = %e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    input_tx: &mpsc::Sender<GameEvent>,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Start) => {
                    forward_command(input_tx, GameEvent::Start, last_input_full_log)
                }
                Ok(ClientMessage::Input(input)) => forward_command(
                    input_tx,
                    GameEvent::Input(input.into()),
                    last_input_full_log,
                ),
                Ok(ClientMessage::Quit) => {
                    forward_command(input_tx, GameEvent::Quit, last_input_full_log)
                }
                Err(parse_err) => {
                    *invalid_json += 1;
                    if should_log(last_invalid_input_log) {
                        warn!(
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to parse client message"
                        );
                    }

                    if *invalid_json > MAX_INVALID_JSON {
                        *close_frame = Some(CloseFrame {
                            code: close_code::POLICY,
                            reason: "too many invalid messages".into(),
                        });
                        return Ok(LoopControl::Disconnect);
                    }

                    Ok(LoopControl::Continue)
                }
            },
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(bytes: Utf8Bytes, socket: &mut WebSocket) -> LoopControl {
    match socket.send(Message::Text(bytes)).await {
        Ok(()) => LoopControl::Continue,
        Err(e) => {
            warn!(error = %e, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

async fn forward_message(msg: &ServerMessage, socket: &mut WebSocket) -> LoopControl {
    match send_message(socket, msg).await {
        Ok(()) => LoopControl::Continue,
        Err(e) => {
            warn!(error = %e, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(
    input_tx: &mpsc::Sender<GameEvent>,
    invalid_json: u32,
) -> Result<(), NetError> {
    // Release any held keys so the player tank does not keep driving.
    input_tx
        .send(GameEvent::Input(PlayerInput::default()))
        .await
        .map_err(|_| NetError::InputClosed)?;

    info!(invalid_json, "presenter disconnected");
    Ok(())
}
