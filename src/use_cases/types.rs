// Use-case level inputs/outputs for the match loop.

use glam::Vec3;

use crate::domain::{BallState, Fault, PaddleState, PlayerSide, RallyPhase};

/// Everything that reaches the simulation does so through this enum, drained
/// at the tick boundary; network callbacks never touch world state directly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PeerJoined { side: PlayerSide },
    PeerLeft,
    /// Raw target paddle pose from the input collaborator.
    PaddleInput { target: Vec3, rot_z: f32 },
    /// The local player releases the held ball upward to serve.
    ServeToss,
    /// Point reset issued by the score keeper (host only).
    Reset(ResetOrder),
    /// Decoded message from the remote peer.
    Remote(RemoteEvent),
}

#[derive(Debug, Clone)]
pub enum RemoteEvent {
    Paddle(PaddleUpdate),
    Serve(BallEvent),
    Hit(BallEvent),
    Toss(TossEvent),
    Out(OutEvent),
    Reset(ResetOrder),
}

#[derive(Debug, Clone, Copy)]
pub struct PaddleUpdate {
    pub side: PlayerSide,
    pub pos: Vec3,
    pub rot_z: f32,
    pub vel: Vec3,
}

/// Authoritative post-impact ball state for a serve or rally hit.
#[derive(Debug, Clone, Copy)]
pub struct BallEvent {
    pub tick: u64,
    pub player: PlayerSide,
    pub pos: Vec3,
    pub vel: Vec3,
    pub spin: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct TossEvent {
    pub tick: u64,
    pub player: PlayerSide,
    pub pos: Vec3,
    pub vel: Vec3,
}

/// The host's point-ended verdict.
#[derive(Debug, Clone, Copy)]
pub struct OutEvent {
    pub tick: u64,
    pub last_bounce_side: Option<PlayerSide>,
    pub server_side_bounced: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResetOrder {
    pub tick: u64,
    pub serving_player: PlayerSide,
}

/// Messages produced by the match loop for the peer, serialized once by the
/// outbound serializer task.
#[derive(Debug, Clone, Copy)]
pub enum OutboundEvent {
    Paddle(PaddleUpdate),
    Serve(BallEvent),
    Hit(BallEvent),
    Toss(TossEvent),
    Out(OutEvent),
    Reset(ResetOrder),
}

/// Fault notification for the score keeper, carrying enough rally context to
/// attribute the lost point.
#[derive(Debug, Clone, Copy)]
pub struct FaultReport {
    pub tick: u64,
    pub fault: Fault,
    pub last_hit: Option<PlayerSide>,
    pub serving_player: PlayerSide,
}

/// Interpolated ball pose for the renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderBall {
    pub pos: Vec3,
    pub vel: Vec3,
    pub spin: Vec3,
    pub frozen: bool,
}

impl RenderBall {
    fn interpolated(prev: Option<&BallState>, current: &BallState, alpha: f32) -> Self {
        let pos = match prev {
            Some(prev) if !current.frozen => prev.pos.lerp(current.pos, alpha),
            _ => current.pos,
        };
        Self {
            pos,
            vel: current.vel,
            spin: current.spin,
            frozen: current.frozen,
        }
    }
}

/// Frame published to the renderer each display frame; `alpha` is the
/// fraction of a physics tick left in the accumulator.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame {
    pub tick: u64,
    pub alpha: f32,
    pub phase: RallyPhase,
    pub ball: Option<RenderBall>,
    pub paddles: [PaddleState; 2],
}

impl RenderFrame {
    pub fn compose(
        tick: u64,
        alpha: f32,
        phase: RallyPhase,
        prev_ball: Option<&BallState>,
        ball: Option<&BallState>,
        paddles: [PaddleState; 2],
    ) -> Self {
        Self {
            tick,
            alpha,
            phase,
            ball: ball.map(|b| RenderBall::interpolated(prev_ball, b, alpha)),
            paddles,
        }
    }
}

impl Default for RenderFrame {
    fn default() -> Self {
        Self {
            tick: 0,
            alpha: 0.0,
            phase: RallyPhase::WaitingForServe,
            ball: None,
            paddles: [
                PaddleState::at(Vec3::ZERO, PlayerSide::Left),
                PaddleState::at(Vec3::ZERO, PlayerSide::Right),
            ],
        }
    }
}
