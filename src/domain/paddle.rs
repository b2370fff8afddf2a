// Paddle state and remote-paddle dead reckoning.

use glam::Vec3;

use crate::domain::ball::PlayerSide;
use crate::domain::tuning::PaddleTuning;

/// Paddle pose and motion at one instant. The local paddle's velocity is
/// derived from kinematic position deltas inside the world step; the remote
/// paddle's comes from the last received update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleState {
    pub pos: Vec3,
    pub rot_z: f32,
    pub vel: Vec3,
    pub side: PlayerSide,
}

impl PaddleState {
    pub fn at(pos: Vec3, side: PlayerSide) -> Self {
        Self {
            pos,
            rot_z: 0.0,
            vel: Vec3::ZERO,
            side,
        }
    }
}

/// The opponent's paddle as seen between network updates.
///
/// Updates arrive at roughly half the physics rate, so between them the
/// displayed pose is dead-reckoned: the last received position extrapolated
/// by its velocity. A large extrapolation error (and a slow paddle) snaps;
/// otherwise the pose eases toward the target exponentially to stay visually
/// plausible.
#[derive(Debug)]
pub struct RemotePaddle {
    side: PlayerSide,
    display: PaddleState,
    last_pos: Vec3,
    last_rot: f32,
    last_vel: Vec3,
    seconds_since_update: f32,
    seen_update: bool,
}

impl RemotePaddle {
    pub fn new(rest_pos: Vec3, side: PlayerSide) -> Self {
        Self {
            side,
            display: PaddleState::at(rest_pos, side),
            last_pos: rest_pos,
            last_rot: 0.0,
            last_vel: Vec3::ZERO,
            seconds_since_update: 0.0,
            seen_update: false,
        }
    }

    pub fn side(&self) -> PlayerSide {
        self.side
    }

    pub fn apply_update(&mut self, pos: Vec3, rot_z: f32, vel: Vec3) {
        self.last_pos = pos;
        self.last_rot = rot_z;
        self.last_vel = vel;
        self.seconds_since_update = 0.0;
        self.seen_update = true;
    }

    /// Advance the displayed pose by `dt` seconds and return it.
    pub fn step(&mut self, dt: f32, cfg: &PaddleTuning) -> PaddleState {
        if !self.seen_update {
            return self.display;
        }

        self.seconds_since_update += dt;
        let target = self.last_pos + self.last_vel * self.seconds_since_update;
        let error = self.display.pos.distance(target);

        if error > cfg.snap_distance && self.last_vel.length() < cfg.fast_speed {
            self.display.pos = target;
            self.display.rot_z = self.last_rot;
        } else {
            let blend = 1.0 - (-cfg.blend_rate * dt).exp();
            self.display.pos = self.display.pos.lerp(target, blend);
            self.display.rot_z += (self.last_rot - self.display.rot_z) * blend;
        }
        self.display.vel = self.last_vel;
        self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn paddle() -> RemotePaddle {
        RemotePaddle::new(Vec3::new(1.4, 0.9, 0.0), PlayerSide::Right)
    }

    #[test]
    fn holds_rest_pose_before_first_update() {
        let mut remote = paddle();
        let before = remote.step(DT, &PaddleTuning::default());
        let after = remote.step(DT, &PaddleTuning::default());
        assert_eq!(before.pos, after.pos);
    }

    #[test]
    fn large_error_snaps_to_extrapolated_target() {
        let cfg = PaddleTuning::default();
        let mut remote = paddle();
        let far = Vec3::new(1.4, 0.9, 1.0);
        remote.apply_update(far, 0.0, Vec3::ZERO);
        let state = remote.step(DT, &cfg);
        assert_eq!(state.pos, far);
    }

    #[test]
    fn small_error_blends_smoothly() {
        let cfg = PaddleTuning::default();
        let mut remote = paddle();
        let near = Vec3::new(1.4, 0.9, 0.05);
        remote.apply_update(near, 0.0, Vec3::ZERO);
        let state = remote.step(DT, &cfg);
        assert!(state.pos.z > 0.0 && state.pos.z < 0.05);
    }

    #[test]
    fn extrapolates_with_last_known_velocity() {
        let cfg = PaddleTuning::default();
        let mut remote = paddle();
        remote.apply_update(Vec3::new(1.4, 0.9, 0.0), 0.0, Vec3::new(0.0, 0.0, 6.0));
        let mut z = 0.0;
        for _ in 0..30 {
            z = remote.step(DT, &cfg).pos.z;
        }
        // Half a second at 6 m/s should have dragged the display well along.
        assert!(z > 1.0, "extrapolated z = {z}");
    }
}
