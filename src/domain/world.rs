// Fixed-timestep rigid-body world: ball, two kinematic paddles, and the
// static table/net/floor colliders.
//
// Collision events are returned from `step()` as a drained queue rather than
// fired through callbacks, so nothing mutates the world re-entrantly during
// the solver pass. Each event fires exactly once per contact onset: a retained
// contact set edge-triggers them, so a ball resting on a surface reports one
// event, not one per frame.

use glam::Vec3;

use crate::domain::ball::{BallState, PlayerSide};
use crate::domain::paddle::PaddleState;
use crate::domain::spin;
use crate::domain::tuning::{BallTuning, PaddleTuning, SpinTuning, TableTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    BallPaddle { side: PlayerSide },
    BallTable { side: PlayerSide },
    BallNet,
    BallFloor,
}

#[derive(Debug, Default, Clone, Copy)]
struct ContactSet {
    paddles: [bool; 2],
    table: bool,
    net: bool,
    floor: bool,
}

#[derive(Debug)]
struct PaddleBody {
    state: PaddleState,
    target_pos: Vec3,
    target_rot: f32,
}

#[derive(Debug)]
pub struct RigidBodyWorld {
    // None until the match spawns the ball; every ball setter no-ops until
    // then, which covers the startup race without panicking.
    ball: Option<BallState>,
    paddles: [PaddleBody; 2],
    contacts: ContactSet,
    apply_spin: bool,
    dt: f32,
    events: Vec<CollisionEvent>,
    ball_cfg: BallTuning,
    paddle_cfg: PaddleTuning,
    spin_cfg: SpinTuning,
    table: TableTuning,
}

fn idx(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Left => 0,
        PlayerSide::Right => 1,
    }
}

const SIDES: [PlayerSide; 2] = [PlayerSide::Left, PlayerSide::Right];

impl RigidBodyWorld {
    pub fn new(dt: f32) -> Self {
        let ball_cfg = BallTuning::default();
        let paddle_cfg = PaddleTuning::default();
        let spin_cfg = SpinTuning::default();
        let table = TableTuning::default();

        let paddles = SIDES.map(|side| {
            let rest = paddle_rest_position(&table, side);
            PaddleBody {
                state: PaddleState::at(rest, side),
                target_pos: rest,
                target_rot: 0.0,
            }
        });

        Self {
            ball: None,
            paddles,
            contacts: ContactSet::default(),
            apply_spin: false,
            dt,
            events: Vec::new(),
            ball_cfg,
            paddle_cfg,
            spin_cfg,
            table,
        }
    }

    pub fn tick_dt(&self) -> f32 {
        self.dt
    }

    pub fn ball_tuning(&self) -> &BallTuning {
        &self.ball_cfg
    }

    pub fn spin_tuning(&self) -> &SpinTuning {
        &self.spin_cfg
    }

    pub fn table_tuning(&self) -> &TableTuning {
        &self.table
    }

    /// Where the serving player holds the ball before the toss.
    pub fn serve_anchor(&self, side: PlayerSide) -> Vec3 {
        Vec3::new(
            -side.sign() * (self.table.half_length() + self.table.serve_setback),
            self.table.height + self.table.serve_hold_height,
            0.0,
        )
    }

    pub fn paddle_rest(&self, side: PlayerSide) -> Vec3 {
        paddle_rest_position(&self.table, side)
    }

    // --- Ball accessors & setters -------------------------------------------

    pub fn spawn_ball(&mut self, state: BallState) {
        self.ball = Some(state);
        self.contacts = ContactSet::default();
    }

    pub fn ball(&self) -> Option<&BallState> {
        self.ball.as_ref()
    }

    pub fn set_ball_state(&mut self, state: BallState) {
        if let Some(ball) = self.ball.as_mut() {
            *ball = state;
        }
    }

    pub fn freeze_ball(&mut self) {
        if let Some(ball) = self.ball.as_mut() {
            ball.frozen = true;
            ball.vel = Vec3::ZERO;
            ball.spin = Vec3::ZERO;
        }
        self.contacts = ContactSet::default();
    }

    /// Unfreeze the held ball and launch it with `vel` (the serve toss).
    pub fn release_ball(&mut self, vel: Vec3) {
        if let Some(ball) = self.ball.as_mut() {
            ball.frozen = false;
            ball.vel = vel;
        }
    }

    pub fn apply_ball_impulse(&mut self, impulse: Vec3) {
        let mass = self.ball_cfg.mass;
        if let Some(ball) = self.ball.as_mut() {
            ball.vel += impulse / mass;
        }
    }

    /// Angular impulse applied straight to the spin proxy.
    pub fn apply_ball_torque(&mut self, torque: Vec3) {
        if let Some(ball) = self.ball.as_mut() {
            ball.spin += torque;
        }
    }

    pub fn set_ball_spin(&mut self, spin: Vec3) {
        if let Some(ball) = self.ball.as_mut() {
            ball.spin = spin;
        }
    }

    pub fn set_apply_spin(&mut self, on: bool) {
        self.apply_spin = on;
    }

    pub fn apply_spin(&self) -> bool {
        self.apply_spin
    }

    // --- Paddles ------------------------------------------------------------

    /// Kinematic drive: the paddle moves toward this target next step, and its
    /// velocity is derived from the resulting position delta.
    pub fn set_paddle_target(&mut self, side: PlayerSide, pos: Vec3, rot_z: f32) {
        let paddle = &mut self.paddles[idx(side)];
        paddle.target_pos = pos;
        paddle.target_rot = rot_z;
    }

    pub fn paddle(&self, side: PlayerSide) -> PaddleState {
        self.paddles[idx(side)].state
    }

    // --- Stepping -----------------------------------------------------------

    /// Advance the world by one fixed timestep and return the collision
    /// events that fired, in contact-onset order.
    pub fn step(&mut self) -> Vec<CollisionEvent> {
        self.step_paddles();
        self.step_ball();
        std::mem::take(&mut self.events)
    }

    fn step_paddles(&mut self) {
        let dt = self.dt;
        let max_step = self.paddle_cfg.follow_speed * dt;
        for paddle in &mut self.paddles {
            let before = paddle.state.pos;
            let delta = paddle.target_pos - before;
            let dist = delta.length();
            let after = if dist <= max_step {
                paddle.target_pos
            } else {
                before + delta * (max_step / dist)
            };
            paddle.state.pos = after;
            paddle.state.vel = (after - before) / dt;
            paddle.state.rot_z = paddle.target_rot;
        }
    }

    fn step_ball(&mut self) {
        let Some(mut ball) = self.ball else {
            return;
        };
        if ball.frozen {
            self.ball = Some(ball);
            return;
        }

        let dt = self.dt;
        ball.vel.y -= self.ball_cfg.gravity * dt;
        if self.apply_spin {
            spin::step_spin(&mut ball, &self.spin_cfg, dt);
        }
        let prev_x = ball.pos.x;
        ball.pos += ball.vel * dt;

        self.resolve_paddle_contacts(&mut ball);
        self.resolve_table_contact(&mut ball);
        self.resolve_net_contact(&mut ball, prev_x);
        self.resolve_floor_contact(&mut ball);

        self.ball = Some(ball);
    }

    fn resolve_paddle_contacts(&mut self, ball: &mut BallState) {
        let r = self.ball_cfg.radius;
        let half = Vec3::new(
            self.paddle_cfg.half_depth,
            self.paddle_cfg.half_height,
            self.paddle_cfg.half_width,
        );

        for side in SIDES {
            let center = self.paddles[idx(side)].state.pos;
            let closest = ball.pos.clamp(center - half, center + half);
            let offset = ball.pos - closest;
            let touching = offset.length_squared() <= r * r;

            if touching {
                // Positional separation only; the collision resolver decides
                // the impulse once it has seen the rally state.
                let dist = offset.length();
                if dist > f32::EPSILON {
                    ball.pos = closest + offset * (r / dist);
                }
                if !self.contacts.paddles[idx(side)] {
                    self.events.push(CollisionEvent::BallPaddle { side });
                }
            }
            self.contacts.paddles[idx(side)] = touching;
        }
    }

    fn resolve_table_contact(&mut self, ball: &mut BallState) {
        let r = self.ball_cfg.radius;
        let surface = self.table.height;
        let bottom = ball.pos.y - r;
        let over_table = ball.pos.x.abs() <= self.table.half_length()
            && ball.pos.z.abs() <= self.table.half_width();
        // Only the surface band counts; a ball under the table edge is not a
        // bounce. The band is wide enough that one step at rally speed cannot
        // tunnel through it.
        let touching = over_table && bottom <= surface && bottom > surface - 0.1;

        if touching {
            if ball.vel.y < 0.0 {
                ball.pos.y = surface + r;
                ball.vel.y = -ball.vel.y * self.ball_cfg.table_restitution;
                ball.spin *= self.ball_cfg.table_spin_keep;
            }
            if !self.contacts.table {
                self.events.push(CollisionEvent::BallTable {
                    side: PlayerSide::of_position(ball.pos),
                });
            }
        }
        self.contacts.table = touching;
    }

    fn resolve_net_contact(&mut self, ball: &mut BallState, prev_x: f32) {
        let r = self.ball_cfg.radius;
        let top = self.table.height + self.table.net_height;
        let band = r + self.table.net_half_thickness;
        let below_top = ball.pos.y - r <= top && ball.pos.y + r >= self.table.height;
        let over_width = ball.pos.z.abs() <= self.table.half_width();
        let in_band = ball.pos.x.abs() <= band;
        // One step at rally speed covers several band widths, so a sign
        // change of x across the step counts as contact even when no sampled
        // position lands inside the band.
        let crossed = (prev_x < -band && ball.pos.x > band) || (prev_x > band && ball.pos.x < -band);
        let touching = below_top && over_width && (in_band || crossed);

        if touching {
            let toward_net = crossed || ball.vel.x * ball.pos.x < 0.0 || ball.pos.x == 0.0;
            if toward_net {
                if crossed {
                    // Put the ball back on its approach side.
                    ball.pos.x = band * prev_x.signum();
                }
                // The net swallows most of the momentum; the rally machine
                // ends the point regardless.
                ball.vel.x = -ball.vel.x * 0.2;
                ball.vel.y *= self.ball_cfg.net_damping;
                ball.vel.z *= self.ball_cfg.net_damping;
            }
            if !self.contacts.net {
                self.events.push(CollisionEvent::BallNet);
            }
        }
        self.contacts.net = touching;
    }

    fn resolve_floor_contact(&mut self, ball: &mut BallState) {
        let r = self.ball_cfg.radius;
        let touching = ball.pos.y - r <= 0.0;

        if touching {
            if ball.vel.y < 0.0 {
                ball.pos.y = r;
                ball.vel.y = -ball.vel.y * 0.3;
                ball.vel.x *= self.ball_cfg.floor_damping;
                ball.vel.z *= self.ball_cfg.floor_damping;
            }
            if !self.contacts.floor {
                self.events.push(CollisionEvent::BallFloor);
            }
        }
        self.contacts.floor = touching;
    }
}

fn paddle_rest_position(table: &TableTuning, side: PlayerSide) -> Vec3 {
    Vec3::new(
        -side.sign() * (table.half_length() + table.paddle_setback),
        table.height + 0.15,
        0.0,
    )
}
