/// Gameplay tuning for tanks.
///
/// Speeds are per tick, not per second: the loop runs at a fixed cadence and
/// every tick advances the simulation by exactly one step.

#[derive(Debug, Clone, Copy)]
pub struct TankTuning {
    /// Distance covered per tick when driving forward or backward.
    pub move_speed: f32,

    /// Rotation per tick in radians.
    pub turn_speed: f32,

    /// Edge length of the square collision box in pixels.
    pub size: f32,

    /// Health every tank starts a game with.
    pub max_health: i32,

    /// Ticks between two shots of the player tank.
    pub player_fire_cooldown: u32,

    /// Ticks between two shots of an AI tank.
    pub ai_fire_cooldown: u32,

    /// AI tanks stop advancing once the player is this close (centre to centre).
    pub ai_engage_distance: f32,

    /// AI tanks only fire when facing the player within this angle (radians).
    pub ai_fire_cone: f32,
}

impl Default for TankTuning {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            turn_speed: 3.0_f32.to_radians(),
            size: 55.0,
            max_health: 100,
            player_fire_cooldown: 50,
            ai_fire_cooldown: 200,
            ai_engage_distance: 250.0,
            ai_fire_cone: 5.0_f32.to_radians(),
        }
    }
}
