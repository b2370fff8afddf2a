// Ball–paddle contact resolution.
//
// The trajectory math is written once in the Left player's frame (+X toward
// the opponent); the X axis is sign-flipped for the Right player. The linear
// impulse is `(target velocity − current velocity) × mass`, so the formulas
// describe where the ball should go, not what force to apply.

use glam::Vec3;

use crate::domain::ball::{BallState, PlayerSide};
use crate::domain::rally::{RallyPhase, RallyState};
use crate::domain::spin;
use crate::domain::tuning::StrikeTuning;
use crate::domain::world::RigidBodyWorld;

/// Outcome of a ball–paddle contact. The snapshots are read after impulse
/// application, so a peer receiving them sees the true post-impact state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddleContact {
    /// Serve strike: rally went live, ball carries no spin.
    Serve { ball: BallState },
    /// Rally strike with the sidespin scalar that was imparted.
    Rally { ball: BallState, spin: f32 },
    /// Double hit, wrong server, held ball, or dead rally.
    Ignored,
}

pub fn resolve_paddle_contact(
    world: &mut RigidBodyWorld,
    rally: &mut RallyState,
    side: PlayerSide,
    cfg: &StrikeTuning,
) -> PaddleContact {
    // Read both bodies once up front.
    let Some(ball) = world.ball().copied() else {
        return PaddleContact::Ignored;
    };
    if ball.frozen {
        return PaddleContact::Ignored;
    }
    let paddle = world.paddle(side);
    let mass = world.ball_tuning().mass;
    let radius = world.ball_tuning().radius;
    let spin_cfg = *world.spin_tuning();

    match rally.phase {
        RallyPhase::PointEnded => PaddleContact::Ignored,

        RallyPhase::WaitingForServe => {
            if side != rally.serving_player {
                return PaddleContact::Ignored;
            }

            let mut target = serve_trajectory(paddle.vel, ball.pos, cfg);
            target.x *= side.sign();

            world.apply_ball_impulse((target - ball.vel) * mass);
            world.set_ball_spin(Vec3::ZERO);
            world.set_apply_spin(false);
            rally.register_serve(side);

            let ball = world.ball().copied().unwrap_or(ball);
            PaddleContact::Serve { ball }
        }

        RallyPhase::InPlay => {
            // Double-hit guard: the same player cannot register two hits in a
            // row within one rally.
            if rally.last_hit == Some(side) {
                return PaddleContact::Ignored;
            }

            let sidespin = spin::paddle_spin(paddle.vel, side, &spin_cfg);
            let mut target = rally_trajectory(paddle.vel, ball.pos, cfg);
            target.x *= side.sign();

            world.apply_ball_impulse((target - ball.vel) * mass);
            world.set_ball_spin(Vec3::new(0.0, sidespin, 0.0));
            world.apply_ball_torque(spin::impact_torque(
                paddle.pos, ball.pos, paddle.vel, radius, &spin_cfg,
            ));
            world.set_apply_spin(true);
            rally.register_hit(side);

            let ball = world.ball().copied().unwrap_or(ball);
            PaddleContact::Rally {
                ball,
                spin: sidespin,
            }
        }
    }
}

/// Serve strike target velocity in the Left frame: a gentle forward arc that
/// clears the ball toward the far side.
fn serve_trajectory(paddle_vel: Vec3, ball_pos: Vec3, cfg: &StrikeTuning) -> Vec3 {
    let forward = cfg.serve_speed + paddle_vel.length() * cfg.serve_carry;
    Vec3::new(forward, cfg.serve_lift, -ball_pos.z * cfg.centering)
}

/// Rally strike target velocity in the Left frame. Deeper contact points get
/// more lift so the return still clears the net.
fn rally_trajectory(paddle_vel: Vec3, ball_pos: Vec3, cfg: &StrikeTuning) -> Vec3 {
    let forward = (cfg.rally_speed + paddle_vel.length() * cfg.rally_carry)
        .clamp(cfg.rally_speed_min, cfg.rally_speed_max);
    let lift = cfg.rally_lift + ball_pos.x.abs() * cfg.rally_lift_per_meter;
    let lateral = paddle_vel.z * cfg.lateral_carry - ball_pos.z * cfg.centering;
    Vec3::new(forward, lift, lateral)
}
