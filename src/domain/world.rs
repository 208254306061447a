// Authoritative entity storage with deferred add/remove queues.
//
// Nothing inserted or removed during a tick becomes visible until the driver
// reconciles the queues, so iteration over the live set is stable for the
// whole tick.

use crate::domain::entity::{Body, Entity, EntityId};
use crate::domain::errors::WorldError;

#[derive(Debug)]
pub struct World {
    live: Vec<Entity>,
    pending_add: Vec<Entity>,
    pending_remove: Vec<EntityId>,
    next_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            next_id: 1,
        }
    }

    /// Queues `entity` for insertion at the next reconciliation.
    ///
    /// Fails with [`WorldError::InvalidState`] if the id is already live,
    /// queued for insertion, or queued for removal.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), WorldError> {
        let id = entity.id;
        if self.is_live(id)
            || self.pending_add.iter().any(|e| e.id == id)
            || self.pending_remove.contains(&id)
        {
            return Err(WorldError::InvalidState(id));
        }

        // Keep the allocator ahead of ids chosen by callers.
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.pending_add.push(entity);
        Ok(())
    }

    /// Allocates a fresh id and queues a new entity with it.
    pub fn spawn(&mut self, x: f32, y: f32, angle: f32, body: Body) -> Result<EntityId, WorldError> {
        let id = EntityId(self.next_id);
        self.add_entity(Entity {
            id,
            x,
            y,
            angle,
            body,
        })?;
        Ok(id)
    }

    /// Marks a live entity for removal at the next reconciliation.
    ///
    /// Marking an id that is already queued is a no-op. Ids that are not live
    /// (never added, still pending insertion, or already purged) fail with
    /// [`WorldError::NotFound`].
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), WorldError> {
        if self.pending_remove.contains(&id) {
            return Ok(());
        }
        if !self.is_live(id) {
            return Err(WorldError::NotFound(id));
        }
        self.pending_remove.push(id);
        Ok(())
    }

    /// Moves every queued insertion into the live set. Returns the committed ids.
    pub fn reconcile_adds(&mut self) -> Vec<EntityId> {
        let added: Vec<EntityId> = self.pending_add.iter().map(|e| e.id).collect();
        self.live.append(&mut self.pending_add);
        added
    }

    /// Purges every queued removal from the live set. Returns the purged ids.
    pub fn reconcile_removes(&mut self) -> Vec<EntityId> {
        let removed = std::mem::take(&mut self.pending_remove);
        if !removed.is_empty() {
            self.live.retain(|e| !removed.contains(&e.id));
        }
        removed
    }

    /// Live entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.live.iter()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.live.iter_mut()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.live.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.iter_mut().find(|e| e.id == id)
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.live.iter().any(|e| e.id == id)
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending_remove.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drops every entity and queue and restarts id allocation.
    pub fn clear(&mut self) {
        self.live.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
        self.next_id = 1;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
