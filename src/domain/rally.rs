// Rally state machine: serve legality, bounce alternation, point-ending.
//
// Only the host peer judges faults; the guest runs the same machine in
// bookkeeping mode (`record_bounce`) and mirrors `PointEnded` when the host's
// BallOut event arrives, so the two peers can never disagree about who lost
// the point.

use crate::domain::ball::PlayerSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallyPhase {
    WaitingForServe,
    InPlay,
    PointEnded,
}

/// Why a point ended. Evaluation is sequential and first-match-wins, in the
/// order these variants are declared; a bounce that violates both alternation
/// and the own-side rule reports `DoubleBounce`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultReason {
    /// Table bounce while still waiting for the serve strike.
    ServeDropped,
    /// First bounce after the serve landed off the server's own side.
    ServeFault,
    /// Two consecutive bounces on the same side.
    DoubleBounce,
    /// Ball bounced on the last hitter's own side.
    OwnSideBounce,
    NetTouch,
    FloorTouch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub reason: FaultReason,
    pub last_bounce_side: Option<PlayerSide>,
    pub server_side_bounced: bool,
}

/// Single mutable rally instance per match.
#[derive(Debug, Clone, Copy)]
pub struct RallyState {
    pub phase: RallyPhase,
    pub serving_player: PlayerSide,
    pub last_hit: Option<PlayerSide>,
    pub last_bounce_side: Option<PlayerSide>,
    pub server_side_bounced: bool,
}

impl RallyState {
    pub fn new(serving_player: PlayerSide) -> Self {
        Self {
            phase: RallyPhase::WaitingForServe,
            serving_player,
            last_hit: None,
            last_bounce_side: None,
            server_side_bounced: false,
        }
    }

    /// The serving player's paddle contacted the ball: the rally is live.
    pub fn register_serve(&mut self, side: PlayerSide) {
        self.phase = RallyPhase::InPlay;
        self.last_hit = Some(side);
        self.last_bounce_side = None;
        self.server_side_bounced = false;
    }

    pub fn register_hit(&mut self, side: PlayerSide) {
        self.last_hit = Some(side);
    }

    /// Host-side judgment of a table bounce. Returns the fault that ended the
    /// point, if any; otherwise updates the bounce bookkeeping.
    pub fn judge_table_bounce(&mut self, bounce_side: PlayerSide) -> Option<Fault> {
        match self.phase {
            RallyPhase::PointEnded => None,
            RallyPhase::WaitingForServe => Some(self.fail(FaultReason::ServeDropped)),
            RallyPhase::InPlay => {
                if !self.server_side_bounced && self.last_bounce_side.is_none() {
                    // First bounce since the serve must land on the server's side.
                    if bounce_side != self.serving_player {
                        return Some(self.fail(FaultReason::ServeFault));
                    }
                    self.server_side_bounced = true;
                    self.last_bounce_side = Some(bounce_side);
                    return None;
                }

                if self.last_bounce_side == Some(bounce_side) {
                    return Some(self.fail(FaultReason::DoubleBounce));
                }
                if self.last_hit == Some(bounce_side) {
                    return Some(self.fail(FaultReason::OwnSideBounce));
                }

                self.last_bounce_side = Some(bounce_side);
                None
            }
        }
    }

    /// Guest-side bookkeeping: track bounce sides without judging, so local
    /// prediction stays aligned while the host's verdict is in flight.
    pub fn record_bounce(&mut self, bounce_side: PlayerSide) {
        if self.phase != RallyPhase::InPlay {
            return;
        }
        if !self.server_side_bounced && self.last_bounce_side.is_none() {
            self.server_side_bounced = bounce_side == self.serving_player;
        }
        self.last_bounce_side = Some(bounce_side);
    }

    pub fn judge_net_touch(&mut self) -> Option<Fault> {
        match self.phase {
            RallyPhase::InPlay => Some(self.fail(FaultReason::NetTouch)),
            _ => None,
        }
    }

    pub fn judge_floor_touch(&mut self) -> Option<Fault> {
        match self.phase {
            RallyPhase::InPlay => Some(self.fail(FaultReason::FloorTouch)),
            // A toss that falls to the floor is a blown serve.
            RallyPhase::WaitingForServe => Some(self.fail(FaultReason::ServeDropped)),
            RallyPhase::PointEnded => None,
        }
    }

    /// Mirror the host's point-ended verdict without local judgment.
    pub fn mirror_point_ended(&mut self) {
        self.phase = RallyPhase::PointEnded;
    }

    /// Atomically reset for the next point with the serve turn handed to
    /// `serving_player`.
    pub fn reset(&mut self, serving_player: PlayerSide) {
        *self = Self::new(serving_player);
    }

    fn fail(&mut self, reason: FaultReason) -> Fault {
        self.phase = RallyPhase::PointEnded;
        Fault {
            reason,
            last_bounce_side: self.last_bounce_side,
            server_side_bounced: self.server_side_bounced,
        }
    }
}
