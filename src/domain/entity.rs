// Domain-level simulation entities and input types.

use std::fmt;

use crate::domain::geometry::Aabb;
use crate::domain::tuning::Tuning;

/// Stable identity of a simulated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of entity variants. Collision dispatch matches on pairs of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    PlayerTank,
    AiTank,
    Shell,
    Wall,
}

impl EntityKind {
    pub fn is_tank(self) -> bool {
        matches!(self, EntityKind::PlayerTank | EntityKind::AiTank)
    }
}

/// Who decides what a tank does each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Player,
    Ai,
}

/// Discrete command set sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fire: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TankState {
    pub controller: Controller,
    pub health: i32,
    // Ticks until the next shot is allowed.
    pub fire_cooldown: u32,
    // Last commanded input; AI tanks write their own decision here.
    pub input: PlayerInput,
}

/// Result of applying damage to a tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Survived { health: i32 },
    Destroyed,
}

impl TankState {
    pub fn new(controller: Controller, health: i32) -> Self {
        Self {
            controller,
            health,
            fire_cooldown: 0,
            input: PlayerInput::default(),
        }
    }

    /// Reduces health by `amount`, clamping at zero.
    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Survived {
                health: self.health,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellState {
    pub owner: EntityId,
    // Velocity per tick.
    pub vx: f32,
    pub vy: f32,
    pub damage: i32,
    // Remaining ticks of range.
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallState {
    pub image: String,
}

/// Type-specific state of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Tank(TankState),
    Shell(ShellState),
    Wall(WallState),
}

/// Any simulated object. Positions are the top-left corner of the collision box.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub body: Body,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match &self.body {
            Body::Tank(tank) => match tank.controller {
                Controller::Player => EntityKind::PlayerTank,
                Controller::Ai => EntityKind::AiTank,
            },
            Body::Shell(_) => EntityKind::Shell,
            Body::Wall(_) => EntityKind::Wall,
        }
    }

    pub fn tank(&self) -> Option<&TankState> {
        match &self.body {
            Body::Tank(tank) => Some(tank),
            _ => None,
        }
    }

    pub fn tank_mut(&mut self) -> Option<&mut TankState> {
        match &mut self.body {
            Body::Tank(tank) => Some(tank),
            _ => None,
        }
    }

    pub fn shell(&self) -> Option<&ShellState> {
        match &self.body {
            Body::Shell(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn bounds(&self, tuning: &Tuning) -> Aabb {
        let size = tuning.size_of(self.kind());
        Aabb::new(self.x, self.y, size, size)
    }

    pub fn center(&self, tuning: &Tuning) -> (f32, f32) {
        self.bounds(tuning).center()
    }
}
