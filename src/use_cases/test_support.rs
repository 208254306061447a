use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::domain::level::SpawnPoint;
use crate::domain::{EntityId, Level, Playfield};
use crate::use_cases::types::Sprite;
use crate::use_cases::view::{Screen, ViewAdapter};

#[derive(Debug, Default)]
pub(crate) struct Recorded {
    pub sprites: BTreeMap<EntityId, Sprite>,
    pub screens: Vec<Screen>,
    pub removed: Vec<EntityId>,
    pub resets: u32,
    pub presents: u32,
}

// View double that records every call so tests can inspect what the driver did.
#[derive(Clone, Default)]
pub(crate) struct RecordingView {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sprite_ids(&self) -> Vec<EntityId> {
        let guard = self.recorded.lock().expect("view mutex poisoned");
        guard.sprites.keys().copied().collect()
    }

    pub(crate) fn sprite(&self, id: EntityId) -> Option<Sprite> {
        let guard = self.recorded.lock().expect("view mutex poisoned");
        guard.sprites.get(&id).cloned()
    }

    pub(crate) fn last_screen(&self) -> Option<Screen> {
        let guard = self.recorded.lock().expect("view mutex poisoned");
        guard.screens.last().copied()
    }

    pub(crate) fn removed(&self) -> Vec<EntityId> {
        let guard = self.recorded.lock().expect("view mutex poisoned");
        guard.removed.clone()
    }

    pub(crate) fn resets(&self) -> u32 {
        self.recorded.lock().expect("view mutex poisoned").resets
    }

    pub(crate) fn presents(&self) -> u32 {
        self.recorded.lock().expect("view mutex poisoned").presents
    }
}

impl ViewAdapter for RecordingView {
    fn add_sprite(&mut self, id: EntityId, image: &str, x: f32, y: f32, angle: f32) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        guard.sprites.insert(
            id,
            Sprite {
                id,
                image: image.to_string(),
                x,
                y,
                angle,
            },
        );
    }

    fn set_sprite_location_and_angle(&mut self, id: EntityId, x: f32, y: f32, angle: f32) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        if let Some(sprite) = guard.sprites.get_mut(&id) {
            sprite.x = x;
            sprite.y = y;
            sprite.angle = angle;
        }
    }

    fn remove_sprite(&mut self, id: EntityId) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        guard.sprites.remove(&id);
        guard.removed.push(id);
    }

    fn reset(&mut self) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        guard.sprites.clear();
        guard.resets += 1;
    }

    fn set_screen(&mut self, screen: Screen) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        guard.screens.push(screen);
    }

    fn present(&mut self, _tick: u64) {
        let mut guard = self.recorded.lock().expect("view mutex poisoned");
        guard.presents += 1;
    }
}

// Open arena with one AI tank facing the player along the same row.
pub(crate) fn duel_level() -> Level {
    Level {
        playfield: Playfield::default(),
        player: SpawnPoint {
            x: 100.0,
            y: 300.0,
            angle_deg: 0.0,
        },
        ai_tanks: vec![SpawnPoint {
            x: 400.0,
            y: 300.0,
            angle_deg: 180.0,
        }],
        walls: Vec::new(),
    }
}
