// Use cases layer: application workflows around the simulation.

pub mod driver;
pub mod game;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use driver::GameDriver;
pub use game::game_task;
pub use types::{Frame, GameEvent, GameOutcome, GamePhase, SessionState, Sprite, TickOutcome};
pub use view::{Screen, ViewAdapter};
