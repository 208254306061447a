use crate::domain::entity::{Body, Controller, Entity, EntityId, ShellState, TankState};
use crate::domain::geometry::{Aabb, Playfield};
use crate::domain::systems::ai;
use crate::domain::tuning::Tuning;
use crate::domain::world::World;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub tuning: Tuning,
    pub playfield: Playfield,
}

/// A shell a tank decided to fire this tick. Queued into the world after the
/// move pass so the live set is never touched while it is being iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellSpawn {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub shell: ShellState,
}

/// Advances one entity by a tick.
///
/// `target` is the centre of the player tank, used by AI tanks to steer.
pub fn move_entity(
    e: &mut Entity,
    cfg: &MovementConfig,
    target: Option<(f32, f32)>,
    spawns: &mut Vec<ShellSpawn>,
) {
    let size = cfg.tuning.size_of(e.kind());
    let Entity {
        id,
        x,
        y,
        angle,
        body,
    } = e;

    match body {
        Body::Tank(tank) => {
            if tank.controller == Controller::Ai {
                let center = (*x + size / 2.0, *y + size / 2.0);
                tank.input = ai::steer(center, *angle, target, &cfg.tuning.tank);
            }
            if let Some(spawn) = tick_tank(*id, x, y, angle, tank, cfg) {
                let shell_size = cfg.tuning.shell.size;
                let bounds = Aabb::new(spawn.x, spawn.y, shell_size, shell_size);
                // A tank facing the edge would fire straight out of the field.
                if cfg.playfield.contains(&bounds) {
                    spawns.push(spawn);
                } else {
                    debug!(
                        owner_id = id.0,
                        x = spawn.x,
                        y = spawn.y,
                        "shell spawn outside playfield; dropping"
                    );
                }
            }
        }
        Body::Shell(shell) => {
            *x += shell.vx;
            *y += shell.vy;
            shell.ttl = shell.ttl.saturating_sub(1);
        }
        Body::Wall(_) => {}
    }
}

fn tick_tank(
    id: EntityId,
    x: &mut f32,
    y: &mut f32,
    angle: &mut f32,
    tank: &mut TankState,
    cfg: &MovementConfig,
) -> Option<ShellSpawn> {
    let tuning = &cfg.tuning;
    let input = tank.input;

    // rotation (+y is down, so a positive turn is clockwise)
    if input.turn_left {
        *angle -= tuning.tank.turn_speed;
    }
    if input.turn_right {
        *angle += tuning.tank.turn_speed;
    }
    *angle = ai::wrap_angle(*angle);

    // direction (0 rad = +x)
    let dir_x = angle.cos();
    let dir_y = angle.sin();

    let mut step = 0.0;
    if input.forward {
        step += tuning.tank.move_speed;
    }
    if input.backward {
        step -= tuning.tank.move_speed;
    }
    *x += dir_x * step;
    *y += dir_y * step;

    // Tanks never leave the playfield; they are held at the edge.
    (*x, *y) = cfg.playfield.clamp(*x, *y, tuning.tank.size);

    tank.fire_cooldown = tank.fire_cooldown.saturating_sub(1);
    if !input.fire || tank.fire_cooldown > 0 {
        return None;
    }

    tank.fire_cooldown = match tank.controller {
        Controller::Player => tuning.tank.player_fire_cooldown,
        Controller::Ai => tuning.tank.ai_fire_cooldown,
    };

    // Spawn just ahead of the tank's box, in the direction it is facing.
    let offset = (tuning.tank.size + tuning.shell.size) / 2.0 + 1.0;
    let center_x = *x + tuning.tank.size / 2.0 + dir_x * offset;
    let center_y = *y + tuning.tank.size / 2.0 + dir_y * offset;

    Some(ShellSpawn {
        x: center_x - tuning.shell.size / 2.0,
        y: center_y - tuning.shell.size / 2.0,
        angle: *angle,
        shell: ShellState {
            owner: id,
            vx: dir_x * tuning.shell.speed,
            vy: dir_y * tuning.shell.speed,
            damage: tuning.shell.damage,
            ttl: tuning.shell.range_ticks,
        },
    })
}

/// True when the entity has left the playfield or run out of range.
pub fn is_out_of_bounds(e: &Entity, cfg: &MovementConfig) -> bool {
    match &e.body {
        // Walls are static and validated at setup.
        Body::Wall(_) => false,
        Body::Shell(shell) if shell.ttl == 0 => true,
        _ => !cfg.playfield.contains(&e.bounds(&cfg.tuning)),
    }
}

/// Queues every live entity that is out of bounds for removal.
pub fn check_bounds(world: &mut World, cfg: &MovementConfig) -> Vec<EntityId> {
    let out: Vec<EntityId> = world
        .entities()
        .filter(|e| is_out_of_bounds(e, cfg))
        .map(|e| e.id)
        .collect();

    for id in &out {
        if let Err(e) = world.remove_entity(*id) {
            warn!(entity_id = id.0, error = %e, "failed to queue out-of-bounds entity");
        }
    }
    out
}
