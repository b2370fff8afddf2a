// Use cases layer: application workflows for the match core.

pub mod match_loop;
pub mod score;
pub mod session;
pub mod types;

pub use match_loop::{MatchLoopDeps, MatchSim, match_task};
pub use score::{Score, point_loser, score_task};
pub use session::SessionRole;
pub use types::{
    BallEvent, FaultReport, OutEvent, OutboundEvent, PaddleUpdate, RemoteEvent, RenderBall,
    RenderFrame, ResetOrder, SessionEvent, TossEvent,
};
