/// Gameplay tuning for shells.

#[derive(Debug, Clone, Copy)]
pub struct ShellTuning {
    /// Distance covered per tick.
    pub speed: f32,

    /// Edge length of the square collision box in pixels.
    pub size: f32,

    /// Health removed from a tank on hit.
    pub damage: i32,

    /// Ticks a shell lives before it is despawned.
    pub range_ticks: u32,
}

impl Default for ShellTuning {
    fn default() -> Self {
        Self {
            speed: 4.0,
            size: 24.0,
            damage: 20,
            range_ticks: 300,
        }
    }
}
