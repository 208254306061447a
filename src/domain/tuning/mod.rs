// Gameplay tuning, kept apart from runtime/server configuration.

pub mod shell;
pub mod tank;

pub use shell::ShellTuning;
pub use tank::TankTuning;

use crate::domain::entity::EntityKind;

/// Bundle of every tuning table the simulation reads.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub tank: TankTuning,
    pub shell: ShellTuning,
    /// Edge length of a wall tile in pixels.
    pub wall_size: f32,
}

impl Tuning {
    /// Edge length of the square collision box used for `kind`.
    pub fn size_of(&self, kind: EntityKind) -> f32 {
        match kind {
            EntityKind::PlayerTank | EntityKind::AiTank => self.tank.size,
            EntityKind::Shell => self.shell.size,
            EntityKind::Wall => self.wall_size,
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tank: TankTuning::default(),
            shell: ShellTuning::default(),
            wall_size: 32.0,
        }
    }
}
