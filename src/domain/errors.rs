// Domain-level errors for world and level handling.

use std::fmt;

use crate::domain::entity::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    // Duplicate id insertion or acting on an entity that is already gone.
    InvalidState(EntityId),
    // The id is not in the live set.
    NotFound(EntityId),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::InvalidState(id) => write!(f, "entity {id} is in an invalid state"),
            WorldError::NotFound(id) => write!(f, "entity {id} is not live"),
        }
    }
}

impl std::error::Error for WorldError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    // The level document could not be parsed.
    Parse(String),
    // The level parsed but describes an unplayable layout.
    Invalid(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse(msg) => write!(f, "failed to parse level: {msg}"),
            LevelError::Invalid(msg) => write!(f, "invalid level: {msg}"),
        }
    }
}

impl std::error::Error for LevelError {}
