// Sprite table view: the concrete view adapter owned by the game task.
//
// It keeps the id -> sprite mapping on the simulation side and hands out an
// immutable frame once per batch of updates. Presenters never see entities.

use std::collections::BTreeMap;

use crate::domain::EntityId;
use crate::use_cases::{Frame, Screen, Sprite, ViewAdapter};
use tokio::sync::{broadcast, watch};
use tracing::warn;

pub struct SpriteTableView {
    sprites: BTreeMap<EntityId, Sprite>,
    frame_tx: broadcast::Sender<Frame>,
    screen_tx: watch::Sender<Screen>,
}

impl SpriteTableView {
    pub fn new(frame_tx: broadcast::Sender<Frame>, screen_tx: watch::Sender<Screen>) -> Self {
        Self {
            sprites: BTreeMap::new(),
            frame_tx,
            screen_tx,
        }
    }

    /// Snapshot of the current table, ordered by id.
    pub fn frame(&self, tick: u64) -> Frame {
        Frame {
            tick,
            sprites: self.sprites.values().cloned().collect(),
        }
    }
}

impl ViewAdapter for SpriteTableView {
    fn add_sprite(&mut self, id: EntityId, image: &str, x: f32, y: f32, angle: f32) {
        let previous = self.sprites.insert(
            id,
            Sprite {
                id,
                image: image.to_string(),
                x,
                y,
                angle,
            },
        );
        if previous.is_some() {
            warn!(entity_id = id.0, "sprite added twice; replacing");
        }
    }

    fn set_sprite_location_and_angle(&mut self, id: EntityId, x: f32, y: f32, angle: f32) {
        match self.sprites.get_mut(&id) {
            Some(sprite) => {
                sprite.x = x;
                sprite.y = y;
                sprite.angle = angle;
            }
            None => warn!(entity_id = id.0, "update for unknown sprite"),
        }
    }

    fn remove_sprite(&mut self, id: EntityId) {
        if self.sprites.remove(&id).is_none() {
            warn!(entity_id = id.0, "remove for unknown sprite");
        }
    }

    fn reset(&mut self) {
        self.sprites.clear();
    }

    fn set_screen(&mut self, screen: Screen) {
        // Keep the value even when nobody is subscribed yet.
        self.screen_tx.send_replace(screen);
    }

    fn present(&mut self, tick: u64) {
        // No receivers just means no presenter is connected.
        let _ = self.frame_tx.send(self.frame(tick));
    }
}
