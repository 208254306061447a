// Use-case level inputs/outputs for the game loop.

use crate::domain::{EntityId, PlayerInput};

#[derive(Debug, Clone)]
pub enum GameEvent {
    // Begin a new game when idle.
    Start,
    // Replace the player's held commands.
    Input(PlayerInput),
    // End the running game at the next tick boundary.
    Quit,
}

/// Driver state machine: `Idle -> Running -> Ending -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Running,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Victory,
    Defeat,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop(GameOutcome),
}

/// High-level session state published to presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    // The last game ended; a new one may be started.
    Ended { outcome: GameOutcome },
}

/// One visible sprite as the view last saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: EntityId,
    pub image: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Immutable snapshot of the sprite table after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tick: u64,
    pub sprites: Vec<Sprite>,
}
