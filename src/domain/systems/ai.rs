// Heuristic controller for AI tanks: face the player, close in, fire when aligned.

use std::f32::consts::{PI, TAU};

use crate::domain::entity::PlayerInput;
use crate::domain::tuning::TankTuning;

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Decides this tick's input for an AI tank centred at `center` and facing `angle`.
///
/// `target` is the centre of the player tank, if one is alive.
pub fn steer(
    center: (f32, f32),
    angle: f32,
    target: Option<(f32, f32)>,
    tuning: &TankTuning,
) -> PlayerInput {
    let Some((tx, ty)) = target else {
        return PlayerInput::default();
    };

    let dx = tx - center.0;
    let dy = ty - center.1;
    let distance = (dx * dx + dy * dy).sqrt();
    let diff = wrap_angle(dy.atan2(dx) - angle);

    PlayerInput {
        forward: distance > tuning.ai_engage_distance && diff.abs() < PI / 2.0,
        backward: false,
        // Within one turn step the residual error is below the fire cone.
        turn_left: diff < -tuning.turn_speed,
        turn_right: diff > tuning.turn_speed,
        fire: diff.abs() <= tuning.ai_fire_cone,
    }
}
