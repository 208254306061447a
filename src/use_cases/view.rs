use crate::domain::EntityId;

/// Which screen the presenter should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Running,
    End,
}

/// Contract the driver uses to keep a view in sync with the world.
///
/// The view holds only visual handles keyed by entity id; the driver never
/// reads anything back from it.
pub trait ViewAdapter: Send {
    fn add_sprite(&mut self, id: EntityId, image: &str, x: f32, y: f32, angle: f32);

    fn set_sprite_location_and_angle(&mut self, id: EntityId, x: f32, y: f32, angle: f32);

    fn remove_sprite(&mut self, id: EntityId);

    /// Discards every sprite.
    fn reset(&mut self);

    fn set_screen(&mut self, screen: Screen);

    /// Called once after every batch of updates (setup, tick, reset) so the
    /// view can publish a consistent frame.
    fn present(&mut self, _tick: u64) {}
}
