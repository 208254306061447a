use std::{env, path::PathBuf, time::Duration};

// Runtime/server settings (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("TANK_GAME_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    // Zero would spin the game task; fall back to the default instead.
    let millis = env::var("TICK_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
    Duration::from_millis(millis)
}

// Level file to load instead of the built-in arena.
pub fn level_path() -> Option<PathBuf> {
    env::var("LEVEL_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;
pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 128;
