// Pairwise collision detection and resolution.
//
// Detection only reads the live set and records effects; `apply_effects` then
// turns them into health changes, removal requests and contact resolution.
// Nothing is deleted from the live set here.

use std::collections::HashSet;

use crate::domain::entity::{DamageOutcome, Entity, EntityId, EntityKind};
use crate::domain::geometry::{Aabb, Playfield};
use crate::domain::tuning::Tuning;
use crate::domain::world::World;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEffect {
    // Two tanks overlap; `mover` gives way unless it is pinned.
    Separate { mover: EntityId, anchor: EntityId },
    // A tank overlaps a wall and must be pushed out of it.
    Block { tank: EntityId, wall: EntityId },
    // A shell hit a tank.
    Damage {
        id: EntityId,
        amount: i32,
        shell: EntityId,
        attacker: EntityId,
    },
    Remove { id: EntityId },
}

/// A tank whose health reached zero while applying effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyedTank {
    pub id: EntityId,
    pub kind: EntityKind,
    pub attacker: EntityId,
}

/// Scans every unordered pair of live entities once and records the effects of
/// each overlap. Entities already queued for removal are ignored.
pub fn detect_collisions(world: &World, tuning: &Tuning) -> Vec<CollisionEffect> {
    let candidates: Vec<&Entity> = world
        .entities()
        .filter(|e| !world.is_pending_removal(e.id))
        .collect();

    // Shells consumed earlier in this pass.
    let mut spent: HashSet<EntityId> = HashSet::new();
    let mut effects = Vec::new();

    for (i, a) in candidates.iter().enumerate() {
        let a_bounds = a.bounds(tuning);
        for b in &candidates[i + 1..] {
            if !a_bounds.overlaps(&b.bounds(tuning)) {
                continue;
            }
            resolve_pair(a, b, tuning, &mut spent, &mut effects);
        }
    }

    effects
}

// Every combination is listed so a new variant fails to compile until handled.
fn resolve_pair(
    a: &Entity,
    b: &Entity,
    tuning: &Tuning,
    spent: &mut HashSet<EntityId>,
    effects: &mut Vec<CollisionEffect>,
) {
    use EntityKind::{AiTank, PlayerTank, Shell, Wall};

    match (a.kind(), b.kind()) {
        (PlayerTank | AiTank, PlayerTank | AiTank) => tank_tank(a, b, effects),
        (PlayerTank | AiTank, Shell) => tank_shell(a, b, spent, effects),
        (Shell, PlayerTank | AiTank) => tank_shell(b, a, spent, effects),
        (PlayerTank | AiTank, Wall) => tank_wall(a, b, effects),
        (Wall, PlayerTank | AiTank) => tank_wall(b, a, effects),
        (Shell, Wall) => shell_wall(a, spent, effects),
        (Wall, Shell) => shell_wall(b, spent, effects),
        // Shells pass through each other; walls never move.
        (Shell, Shell) | (Wall, Wall) => {}
    }
}

fn tank_tank(a: &Entity, b: &Entity, effects: &mut Vec<CollisionEffect>) {
    // The lower id holds its ground.
    let (anchor, mover) = if a.id < b.id { (a, b) } else { (b, a) };
    effects.push(CollisionEffect::Separate {
        mover: mover.id,
        anchor: anchor.id,
    });
}

fn tank_shell(
    tank: &Entity,
    shell: &Entity,
    spent: &mut HashSet<EntityId>,
    effects: &mut Vec<CollisionEffect>,
) {
    let Some(state) = shell.shell() else {
        return;
    };
    // Tanks are immune to their own shells.
    if state.owner == tank.id {
        return;
    }
    if !spent.insert(shell.id) {
        return;
    }
    effects.push(CollisionEffect::Remove { id: shell.id });
    effects.push(CollisionEffect::Damage {
        id: tank.id,
        amount: state.damage,
        shell: shell.id,
        attacker: state.owner,
    });
}

fn tank_wall(tank: &Entity, wall: &Entity, effects: &mut Vec<CollisionEffect>) {
    effects.push(CollisionEffect::Block {
        tank: tank.id,
        wall: wall.id,
    });
}

fn shell_wall(shell: &Entity, spent: &mut HashSet<EntityId>, effects: &mut Vec<CollisionEffect>) {
    if spent.insert(shell.id) {
        effects.push(CollisionEffect::Remove { id: shell.id });
    }
}

/// Applies recorded effects in order and returns the tanks destroyed by them.
///
/// Health changes and removals are applied first; overlapping tanks are then
/// separated from their current positions so pushes never stack.
pub fn apply_effects(
    world: &mut World,
    effects: Vec<CollisionEffect>,
    tuning: &Tuning,
    playfield: Playfield,
) -> Vec<DestroyedTank> {
    let mut destroyed = Vec::new();
    let mut contacts = Vec::new();

    for effect in effects {
        match effect {
            contact @ (CollisionEffect::Separate { .. } | CollisionEffect::Block { .. }) => {
                contacts.push(contact);
            }
            CollisionEffect::Damage {
                id,
                amount,
                shell,
                attacker,
            } => {
                if world.is_pending_removal(id) {
                    debug!(entity_id = id.0, "damage to a tank already destroyed; skipping");
                    continue;
                }
                let Some(e) = world.get_mut(id) else {
                    warn!(entity_id = id.0, "damage target is not live; skipping");
                    continue;
                };
                let kind = e.kind();
                let Some(tank) = e.tank_mut() else {
                    warn!(entity_id = id.0, "damage target is not a tank; skipping");
                    continue;
                };

                let outcome = tank.apply_damage(amount);
                info!(
                    victim_id = id.0,
                    shooter_id = attacker.0,
                    shell_id = shell.0,
                    victim_hp = tank.health,
                    "tank hit"
                );

                if outcome == DamageOutcome::Destroyed {
                    if let Err(e) = world.remove_entity(id) {
                        warn!(entity_id = id.0, error = %e, "failed to queue destroyed tank");
                    }
                    info!(victim_id = id.0, shooter_id = attacker.0, "tank destroyed");
                    destroyed.push(DestroyedTank { id, kind, attacker });
                }
            }
            CollisionEffect::Remove { id } => {
                if let Err(e) = world.remove_entity(id) {
                    warn!(entity_id = id.0, error = %e, "failed to queue collided entity");
                }
            }
        }
    }

    resolve_contacts(world, &contacts, tuning, playfield);
    destroyed
}

// Upper bound on relaxation passes over the contact list.
const MAX_RESOLVE_PASSES: usize = 8;
// Leftover push below this is treated as fully applied.
const PUSH_EPSILON: f32 = 1e-3;

fn resolve_contacts(
    world: &mut World,
    contacts: &[CollisionEffect],
    tuning: &Tuning,
    playfield: Playfield,
) {
    if contacts.is_empty() {
        return;
    }

    let walls: Vec<Aabb> = world
        .entities()
        .filter(|e| e.kind() == EntityKind::Wall)
        .map(|e| e.bounds(tuning))
        .collect();
    let space = FreeSpace {
        size: tuning.tank.size,
        playfield,
        walls: &walls,
    };

    for _ in 0..MAX_RESOLVE_PASSES {
        let mut moved = false;
        for contact in contacts {
            moved |= match *contact {
                CollisionEffect::Separate { mover, anchor } => {
                    separate_tanks(world, mover, anchor, &space)
                }
                CollisionEffect::Block { tank, wall } => {
                    push_out_of_wall(world, tank, wall, tuning, &space)
                }
                _ => false,
            };
        }
        if !moved {
            return;
        }
    }

    debug!(
        contacts = contacts.len(),
        "contacts still overlapping after resolution"
    );
}

// Where a displaced tank may end up: inside the playfield and outside every wall.
struct FreeSpace<'a> {
    size: f32,
    playfield: Playfield,
    walls: &'a [Aabb],
}

impl FreeSpace<'_> {
    fn settle(&self, x: f32, y: f32) -> (f32, f32) {
        let (mut x, mut y) = self.playfield.clamp(x, y, self.size);
        for wall in self.walls {
            let bounds = Aabb::new(x, y, self.size, self.size);
            if let Some((dx, dy)) = bounds.separation(wall) {
                (x, y) = self.playfield.clamp(x + dx, y + dy, self.size);
            }
        }
        (x, y)
    }
}

// Live, not yet destroyed tank position.
fn tank_position(world: &World, id: EntityId) -> Option<(f32, f32)> {
    if world.is_pending_removal(id) {
        return None;
    }
    world
        .get(id)
        .filter(|e| e.kind().is_tank())
        .map(|e| (e.x, e.y))
}

fn set_position(world: &mut World, id: EntityId, (x, y): (f32, f32)) {
    if let Some(e) = world.get_mut(id) {
        e.x = x;
        e.y = y;
    }
}

fn separate_tanks(
    world: &mut World,
    mover: EntityId,
    anchor: EntityId,
    space: &FreeSpace<'_>,
) -> bool {
    let (Some(from), Some(anchor_at)) = (tank_position(world, mover), tank_position(world, anchor))
    else {
        return false;
    };
    let size = space.size;
    let Some((dx, dy)) = Aabb::new(from.0, from.1, size, size)
        .separation(&Aabb::new(anchor_at.0, anchor_at.1, size, size))
    else {
        return false;
    };

    let to = space.settle(from.0 + dx, from.1 + dy);
    set_position(world, mover, to);

    // Whatever the edge or a wall absorbed is taken up by the anchor.
    let rest_x = if dx != 0.0 { dx - (to.0 - from.0) } else { 0.0 };
    let rest_y = if dy != 0.0 { dy - (to.1 - from.1) } else { 0.0 };
    if rest_x.abs() > PUSH_EPSILON || rest_y.abs() > PUSH_EPSILON {
        let anchor_to = space.settle(anchor_at.0 - rest_x, anchor_at.1 - rest_y);
        set_position(world, anchor, anchor_to);
    }
    true
}

fn push_out_of_wall(
    world: &mut World,
    tank: EntityId,
    wall: EntityId,
    tuning: &Tuning,
    space: &FreeSpace<'_>,
) -> bool {
    let Some(from) = tank_position(world, tank) else {
        return false;
    };
    let Some(wall_bounds) = world.get(wall).map(|w| w.bounds(tuning)) else {
        return false;
    };
    let Some((dx, dy)) = Aabb::new(from.0, from.1, space.size, space.size).separation(&wall_bounds)
    else {
        return false;
    };
    let to = space.playfield.clamp(from.0 + dx, from.1 + dy, space.size);
    set_position(world, tank, to);
    true
}
