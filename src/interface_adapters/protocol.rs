// Wire protocol DTOs and conversions for presenter messages.

use crate::domain::PlayerInput;
use crate::use_cases::{Frame, GameOutcome, Screen, SessionState, Sprite};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected presenters over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Sprite table after a tick.
    Frame(FrameDto),
    // Which screen to show.
    Screen(ScreenDto),
    // Session lifecycle (idle, running, ended with an outcome).
    Session(SessionDto),
}

/// Messages a presenter sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Start,
    // Held commands; replaces the previous input.
    Input(PlayerInputDto),
    Quit,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub backward: bool,
    #[serde(default)]
    pub turn_left: bool,
    #[serde(default)]
    pub turn_right: bool,
    #[serde(default)]
    pub fire: bool,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            forward: input.forward,
            backward: input.backward,
            turn_left: input.turn_left,
            turn_right: input.turn_right,
            fire: input.fire,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameDto {
    pub tick: u64,
    pub sprites: Vec<SpriteDto>,
}

impl From<Frame> for FrameDto {
    fn from(frame: Frame) -> Self {
        Self {
            tick: frame.tick,
            sprites: frame.sprites.iter().map(SpriteDto::from).collect(),
        }
    }
}

/// Flattened sprite for wire transmission. Ids are strings so clients never
/// lose precision on large values.
#[derive(Debug, Clone, Serialize)]
pub struct SpriteDto {
    pub id: String,
    pub image: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl From<&Sprite> for SpriteDto {
    fn from(sprite: &Sprite) -> Self {
        Self {
            id: sprite.id.to_string(),
            image: sprite.image.clone(),
            x: sprite.x,
            y: sprite.y,
            angle: sprite.angle,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum ScreenDto {
    Start,
    Running,
    End,
}

impl From<Screen> for ScreenDto {
    fn from(screen: Screen) -> Self {
        match screen {
            Screen::Start => ScreenDto::Start,
            Screen::Running => ScreenDto::Running,
            Screen::End => ScreenDto::End,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum OutcomeDto {
    Victory,
    Defeat,
    Quit,
}

impl From<GameOutcome> for OutcomeDto {
    fn from(outcome: GameOutcome) -> Self {
        match outcome {
            GameOutcome::Victory => OutcomeDto::Victory,
            GameOutcome::Defeat => OutcomeDto::Defeat,
            GameOutcome::Quit => OutcomeDto::Quit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum SessionDto {
    Idle,
    Running,
    Ended { outcome: OutcomeDto },
}

impl From<SessionState> for SessionDto {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => SessionDto::Idle,
            SessionState::Running => SessionDto::Running,
            SessionState::Ended { outcome } => SessionDto::Ended {
                outcome: outcome.into(),
            },
        }
    }
}
