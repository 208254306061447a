// Static level data: playfield size, tank spawn points and wall placements.

use serde::Deserialize;

use crate::domain::errors::LevelError;
use crate::domain::geometry::{Aabb, Playfield};
use crate::domain::tuning::Tuning;

const BUILTIN_LEVEL: &str = include_str!("../../levels/default.toml");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle_deg: f32,
}

impl SpawnPoint {
    pub fn angle(&self) -> f32 {
        self.angle_deg.to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WallPlacement {
    pub x: f32,
    pub y: f32,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Level {
    pub playfield: Playfield,
    pub player: SpawnPoint,
    #[serde(default)]
    pub ai_tanks: Vec<SpawnPoint>,
    // Order matters: walls are spawned, and get ids, in this order.
    #[serde(default)]
    pub walls: Vec<WallPlacement>,
}

impl Level {
    pub fn from_toml_str(source: &str) -> Result<Self, LevelError> {
        toml::from_str(source).map_err(|e| LevelError::Parse(e.to_string()))
    }

    /// The arena bundled with the binary.
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_toml_str(BUILTIN_LEVEL)
    }

    /// Rejects layouts the simulation cannot start from.
    pub fn validate(&self, tuning: &Tuning) -> Result<(), LevelError> {
        let field = self.playfield;
        if !(field.width.is_finite() && field.height.is_finite())
            || field.width <= 0.0
            || field.height <= 0.0
        {
            return Err(LevelError::Invalid(format!(
                "playfield must have a positive finite size, got {}x{}",
                field.width, field.height
            )));
        }

        let tank_size = tuning.tank.size;
        let mut tanks = Vec::with_capacity(1 + self.ai_tanks.len());
        for (label, spawn) in std::iter::once(("player", &self.player))
            .chain(self.ai_tanks.iter().map(|s| ("ai tank", s)))
        {
            if !(spawn.x.is_finite() && spawn.y.is_finite() && spawn.angle_deg.is_finite()) {
                return Err(LevelError::Invalid(format!("{label} spawn is not finite")));
            }
            let bounds = Aabb::new(spawn.x, spawn.y, tank_size, tank_size);
            if !field.contains(&bounds) {
                return Err(LevelError::Invalid(format!(
                    "{label} spawn ({}, {}) is outside the playfield",
                    spawn.x, spawn.y
                )));
            }
            if tanks.iter().any(|other: &Aabb| other.overlaps(&bounds)) {
                return Err(LevelError::Invalid(format!(
                    "{label} spawn ({}, {}) overlaps another tank spawn",
                    spawn.x, spawn.y
                )));
            }
            tanks.push(bounds);
        }

        for (index, wall) in self.walls.iter().enumerate() {
            if wall.image.trim().is_empty() {
                return Err(LevelError::Invalid(format!("wall {index} has no image")));
            }
            if !(wall.x.is_finite() && wall.y.is_finite()) {
                return Err(LevelError::Invalid(format!("wall {index} is not finite")));
            }
            let bounds = Aabb::new(wall.x, wall.y, tuning.wall_size, tuning.wall_size);
            if !field.contains(&bounds) {
                return Err(LevelError::Invalid(format!(
                    "wall {index} at ({}, {}) is outside the playfield",
                    wall.x, wall.y
                )));
            }
            if tanks.iter().any(|tank| tank.overlaps(&bounds)) {
                return Err(LevelError::Invalid(format!(
                    "wall {index} overlaps a tank spawn"
                )));
            }
        }

        Ok(())
    }
}
