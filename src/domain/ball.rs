// Ball state and player side tags.
//
// Coordinate system (shared by the whole domain):
// - X runs along the table length; the Left player occupies x < 0 and hits
//   toward +X, the Right player occupies x > 0 and hits toward -X.
// - Y is vertical, with the floor at y = 0.
// - Z runs across the table width.

use glam::Vec3;

/// Which end of the table a player (or a table bounce) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSide {
    Left,
    Right,
}

impl PlayerSide {
    /// Sign of the direction this side hits toward along the X axis.
    pub fn sign(self) -> f32 {
        match self {
            PlayerSide::Left => 1.0,
            PlayerSide::Right => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            PlayerSide::Left => PlayerSide::Right,
            PlayerSide::Right => PlayerSide::Left,
        }
    }

    /// Side of the table a position belongs to, by the sign of its X coordinate.
    pub fn of_position(pos: Vec3) -> Self {
        if pos.x < 0.0 {
            PlayerSide::Left
        } else {
            PlayerSide::Right
        }
    }
}

/// Complete ball state at one instant.
///
/// `spin` is an angular-velocity proxy: its direction is the rotation axis and
/// its magnitude feeds the simplified Magnus nudge, not a full aerodynamic
/// model. A frozen ball (serve hold) keeps its position but ignores gravity
/// and integration until released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallState {
    pub pos: Vec3,
    pub vel: Vec3,
    pub spin: Vec3,
    pub frozen: bool,
}

impl BallState {
    pub fn held_at(pos: Vec3) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            spin: Vec3::ZERO,
            frozen: true,
        }
    }

    pub fn moving(pos: Vec3, vel: Vec3) -> Self {
        Self {
            pos,
            vel,
            spin: Vec3::ZERO,
            frozen: false,
        }
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::held_at(Vec3::ZERO)
    }
}
