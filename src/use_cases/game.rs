use super::driver::GameDriver;
use super::types::{GameEvent, GameOutcome, SessionState, TickOutcome};
use super::view::ViewAdapter;
use crate::domain::{Level, PlayerInput};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// The single authoritative simulation task.
///
/// Waits for `Start` while idle, then ticks the driver at `tick_interval`
/// until the game ends, publishing session changes along the way. Every world
/// mutation happens on this task; presenters only see what the view publishes.
pub async fn game_task<V: ViewAdapter>(
    mut driver: GameDriver<V>,
    level: Arc<Level>,
    mut input_rx: mpsc::Receiver<GameEvent>,
    session_tx: watch::Sender<SessionState>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    driver.show_start_screen();
    session_tx.send_replace(SessionState::Idle);

    loop {
        let event = tokio::select! {
            _ = shutdown.notified() => break,
            event = input_rx.recv() => event,
        };

        match event {
            Some(GameEvent::Start) => {}
            Some(other) => {
                debug!(event = ?other, "ignoring event while idle");
                continue;
            }
            None => {
                info!("input channel closed; game task exiting");
                break;
            }
        }

        if let Err(e) = driver.set_up_game(&level) {
            // Bad configuration ends only this session attempt.
            error!(error = %e, "failed to set up game");
            driver.show_start_screen();
            continue;
        }
        session_tx.send_replace(SessionState::Running);

        let Some(outcome) = run_session(&mut driver, &mut input_rx, tick_interval, &shutdown).await
        else {
            driver.reset_game();
            // Presenters must not keep showing a game that no longer runs.
            session_tx.send_replace(SessionState::Idle);
            break;
        };

        session_tx.send_replace(SessionState::Ended { outcome });
        driver.reset_game();
    }

    info!("game task stopped");
}

// Ticks until the game stops; `None` means shutdown was requested.
async fn run_session<V: ViewAdapter>(
    driver: &mut GameDriver<V>,
    input_rx: &mut mpsc::Receiver<GameEvent>,
    tick_interval: Duration,
    shutdown: &Notify,
) -> Option<GameOutcome> {
    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input = PlayerInput::default();

    loop {
        // The stop flag is only observed between ticks, never mid-tick.
        tokio::select! {
            _ = shutdown.notified() => {
                info!(tick = driver.tick(), "shutdown requested; leaving game");
                return None;
            }
            _ = interval.tick() => {}
        }

        // Sample everything that arrived since the last tick; the latest input wins.
        loop {
            match input_rx.try_recv() {
                Ok(GameEvent::Input(latest)) => input = latest,
                Ok(GameEvent::Quit) => driver.request_quit(),
                Ok(GameEvent::Start) => debug!("start ignored; game already running"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("input channel closed; quitting game");
                    driver.request_quit();
                    break;
                }
            }
        }

        if let TickOutcome::Stop(outcome) = driver.update_game(input) {
            return Some(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tuning;
    use crate::use_cases::test_support::{RecordingView, duel_level};
    use crate::use_cases::view::Screen;

    struct Harness {
        input_tx: mpsc::Sender<GameEvent>,
        session_rx: watch::Receiver<SessionState>,
        shutdown: Arc<Notify>,
        view: RecordingView,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn_game(level: Level) -> Harness {
        let view = RecordingView::new();
        let driver = GameDriver::new(view.clone(), Tuning::default());
        let (input_tx, input_rx) = mpsc::channel(64);
        let (session_tx, session_rx) = watch::channel(SessionState::Idle);
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(game_task(
            driver,
            Arc::new(level),
            input_rx,
            session_tx,
            Duration::from_millis(1),
            shutdown.clone(),
        ));

        Harness {
            input_tx,
            session_rx,
            shutdown,
            view,
            task,
        }
    }

    async fn wait_for(
        session_rx: &mut watch::Receiver<SessionState>,
        wanted: impl Fn(&SessionState) -> bool,
    ) -> SessionState {
        tokio::time::timeout(Duration::from_secs(5), session_rx.wait_for(|s| wanted(s)))
            .await
            .expect("session state should change in time")
            .expect("session channel should stay open")
            .clone()
    }

    #[tokio::test]
    async fn when_quit_is_sent_then_session_ends_and_world_is_reset() {
        let mut h = spawn_game(duel_level());

        h.input_tx.send(GameEvent::Start).await.expect("send start");
        wait_for(&mut h.session_rx, |s| *s == SessionState::Running).await;
        assert_eq!(h.view.last_screen(), Some(Screen::Running));

        h.input_tx.send(GameEvent::Quit).await.expect("send quit");
        let state = wait_for(&mut h.session_rx, |s| matches!(s, SessionState::Ended { .. })).await;

        assert_eq!(
            state,
            SessionState::Ended {
                outcome: GameOutcome::Quit
            }
        );
        assert_eq!(h.view.last_screen(), Some(Screen::End));

        h.shutdown.notify_one();
        h.task.await.expect("game task should exit cleanly");
        assert!(h.view.sprite_ids().is_empty());
        assert_eq!(h.view.resets(), 1);
    }

    #[tokio::test]
    async fn game_can_be_restarted_after_it_ends() {
        let mut h = spawn_game(duel_level());

        for _ in 0..2 {
            h.input_tx.send(GameEvent::Start).await.expect("send start");
            wait_for(&mut h.session_rx, |s| *s == SessionState::Running).await;
            h.input_tx.send(GameEvent::Quit).await.expect("send quit");
            wait_for(&mut h.session_rx, |s| matches!(s, SessionState::Ended { .. })).await;
        }

        h.shutdown.notify_one();
        h.task.await.expect("game task should exit cleanly");
        assert_eq!(h.view.resets(), 2);
    }

    #[tokio::test]
    async fn when_shutdown_arrives_mid_game_then_session_returns_to_idle() {
        let mut h = spawn_game(duel_level());

        h.input_tx.send(GameEvent::Start).await.expect("send start");
        wait_for(&mut h.session_rx, |s| *s == SessionState::Running).await;

        h.shutdown.notify_one();
        h.task.await.expect("game task should exit cleanly");

        assert_eq!(*h.session_rx.borrow_and_update(), SessionState::Idle);
        assert!(h.view.sprite_ids().is_empty());
        assert_eq!(h.view.resets(), 1);
    }

    #[tokio::test]
    async fn when_level_is_invalid_then_task_stays_idle() {
        let mut level = duel_level();
        level.playfield.width = -1.0;
        let mut h = spawn_game(level);

        h.input_tx.send(GameEvent::Start).await.expect("send start");
        // Give the task a moment to reject the level.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*h.session_rx.borrow_and_update(), SessionState::Idle);
        assert_eq!(h.view.last_screen(), Some(Screen::Start));
        assert!(h.view.sprite_ids().is_empty());

        h.shutdown.notify_one();
        h.task.await.expect("game task should exit cleanly");
    }

    #[tokio::test]
    async fn when_inputs_close_then_task_exits() {
        let h = spawn_game(duel_level());

        drop(h.input_tx);

        tokio::time::timeout(Duration::from_secs(5), h.task)
            .await
            .expect("task should exit once inputs close")
            .expect("game task should not panic");
    }
}
