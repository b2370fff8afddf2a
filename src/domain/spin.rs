// Spin model: paddle-imparted spin, per-tick Magnus nudge, impact torque.
//
// Spin is a simplified angular-velocity proxy. It curves the ball with a
// per-tick additive velocity nudge proportional to `vel × spin`, not with a
// full aerodynamic model; this is cheap, deterministic, and close enough for
// a game at 60 Hz.

use glam::Vec3;

use crate::domain::ball::{BallState, PlayerSide};
use crate::domain::tuning::SpinTuning;

/// Sidespin imparted by a swing, from the paddle's speed and the direction of
/// its lateral (across-table) motion.
///
/// Below `activation_speed` the swing imparts nothing. Above it, magnitude
/// ramps linearly up to `cap_speed` and clamps at `max_spin`. The sign is
/// mirrored by paddle side so that identical swings from the two ends of the
/// table produce mirrored spin.
pub fn paddle_spin(paddle_vel: Vec3, side: PlayerSide, cfg: &SpinTuning) -> f32 {
    let speed = paddle_vel.length();
    if speed < cfg.activation_speed {
        return 0.0;
    }

    let ramp = (speed - cfg.activation_speed) / (cfg.cap_speed - cfg.activation_speed);
    let magnitude = (ramp.clamp(0.0, 1.0) * cfg.max_spin).min(cfg.max_spin);

    let lateral = if paddle_vel.z < 0.0 { -1.0 } else { 1.0 };
    magnitude * lateral * side.sign()
}

/// One tick of spin integration: Magnus velocity nudge plus multiplicative
/// decay. The caller gates this on the world's `apply_spin` flag, so serves
/// fly straight.
///
/// Inside `rest_band` the nudge stops entirely; decaying spin would otherwise
/// keep perturbing the ball with ever-smaller wobbles.
pub fn step_spin(ball: &mut BallState, cfg: &SpinTuning, dt: f32) {
    if ball.spin.length_squared() < cfg.rest_band * cfg.rest_band {
        return;
    }

    ball.vel += ball.vel.cross(ball.spin) * cfg.magnus_factor * dt;
    ball.spin *= cfg.decay_factor;
}

/// Torque from an off-center paddle impact.
///
/// The lever arm is the unit vector from paddle center to ball center; when
/// the contact is dead center we fall back to "up" rather than dividing by
/// zero. Crossing it with the paddle velocity yields topspin, backspin, or
/// sidespin depending on where the ball was struck. The result is clamped to
/// `max_torque`.
pub fn impact_torque(
    paddle_pos: Vec3,
    ball_pos: Vec3,
    paddle_vel: Vec3,
    ball_radius: f32,
    cfg: &SpinTuning,
) -> Vec3 {
    let offset = ball_pos - paddle_pos;
    let lever = if offset.length_squared() < f32::EPSILON {
        Vec3::Y
    } else {
        offset.normalize()
    };

    let torque = lever.cross(paddle_vel) * (cfg.torque_factor * ball_radius / 0.02);
    torque.clamp_length_max(cfg.max_torque)
}
