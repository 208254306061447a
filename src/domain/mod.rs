// Domain layer: core simulation types and rules.

pub mod entity;
pub mod errors;
pub mod geometry;
pub mod level;
pub mod systems;
pub mod tuning;
pub mod world;

pub use entity::{
    Body, Controller, DamageOutcome, Entity, EntityId, EntityKind, PlayerInput, ShellState,
    TankState, WallState,
};
pub use errors::{LevelError, WorldError};
pub use geometry::{Aabb, Playfield};
pub use level::Level;
pub use tuning::Tuning;
pub use world::World;
