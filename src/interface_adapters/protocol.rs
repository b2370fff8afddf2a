// Wire protocol DTOs and conversions for peer-to-peer match messages.
// The protocol is symmetric: both peers send and receive the same envelope.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::domain::PlayerSide;
use crate::use_cases::{
    BallEvent, OutEvent, OutboundEvent, PaddleUpdate, RemoteEvent, ResetOrder, SessionEvent,
    TossEvent,
};

/// Messages exchanged between the two peers over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PeerMessage {
    // Sent once by the host right after the upgrade; assigns the guest's side.
    Hello(HelloPayload),
    // Paddle pose, sent at the sync cadence while the match runs.
    Paddle(PaddleDto),
    // Serve toss release; the ball leaves the server's hand.
    BallToss(BallTossDto),
    // Authoritative post-impact ball state for the serve strike.
    BallServe(BallStrikeDto),
    // Authoritative post-impact ball state for a rally hit.
    BallHit(BallStrikeDto),
    // Host verdict: the point is over.
    BallOut(BallOutDto),
    // Host order: rearm for the next point.
    BallReset(BallResetDto),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HelloPayload {
    pub side: PlayerSideDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSideDto {
    Left,
    Right,
}

impl From<PlayerSide> for PlayerSideDto {
    fn from(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Left => PlayerSideDto::Left,
            PlayerSide::Right => PlayerSideDto::Right,
        }
    }
}

impl From<PlayerSideDto> for PlayerSide {
    fn from(side: PlayerSideDto) -> Self {
        match side {
            PlayerSideDto::Left => PlayerSide::Left,
            PlayerSideDto::Right => PlayerSide::Right,
        }
    }
}

/// Flattened vector for wire transmission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vec3Dto {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Dto {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Dto> for Vec3 {
    fn from(v: Vec3Dto) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaddleDto {
    pub side: PlayerSideDto,
    pub pos: Vec3Dto,
    pub rot_z: f32,
    pub vel: Vec3Dto,
}

impl From<PaddleUpdate> for PaddleDto {
    fn from(update: PaddleUpdate) -> Self {
        Self {
            side: update.side.into(),
            pos: update.pos.into(),
            rot_z: update.rot_z,
            vel: update.vel.into(),
        }
    }
}

impl From<PaddleDto> for PaddleUpdate {
    fn from(dto: PaddleDto) -> Self {
        Self {
            side: dto.side.into(),
            pos: dto.pos.into(),
            rot_z: dto.rot_z,
            vel: dto.vel.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallTossDto {
    pub tick: u64,
    pub player: PlayerSideDto,
    pub pos: Vec3Dto,
    pub vel: Vec3Dto,
}

impl From<TossEvent> for BallTossDto {
    fn from(ev: TossEvent) -> Self {
        Self {
            tick: ev.tick,
            player: ev.player.into(),
            pos: ev.pos.into(),
            vel: ev.vel.into(),
        }
    }
}

impl From<BallTossDto> for TossEvent {
    fn from(dto: BallTossDto) -> Self {
        Self {
            tick: dto.tick,
            player: dto.player.into(),
            pos: dto.pos.into(),
            vel: dto.vel.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallStrikeDto {
    pub tick: u64,
    pub player: PlayerSideDto,
    pub pos: Vec3Dto,
    pub vel: Vec3Dto,
    pub spin: Vec3Dto,
}

impl From<BallEvent> for BallStrikeDto {
    fn from(ev: BallEvent) -> Self {
        Self {
            tick: ev.tick,
            player: ev.player.into(),
            pos: ev.pos.into(),
            vel: ev.vel.into(),
            spin: ev.spin.into(),
        }
    }
}

impl From<BallStrikeDto> for BallEvent {
    fn from(dto: BallStrikeDto) -> Self {
        Self {
            tick: dto.tick,
            player: dto.player.into(),
            pos: dto.pos.into(),
            vel: dto.vel.into(),
            spin: dto.spin.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallOutDto {
    pub tick: u64,
    #[serde(default)]
    pub last_bounce_side: Option<PlayerSideDto>,
    pub server_side_bounced: bool,
}

impl From<OutEvent> for BallOutDto {
    fn from(ev: OutEvent) -> Self {
        Self {
            tick: ev.tick,
            last_bounce_side: ev.last_bounce_side.map(Into::into),
            server_side_bounced: ev.server_side_bounced,
        }
    }
}

impl From<BallOutDto> for OutEvent {
    fn from(dto: BallOutDto) -> Self {
        Self {
            tick: dto.tick,
            last_bounce_side: dto.last_bounce_side.map(Into::into),
            server_side_bounced: dto.server_side_bounced,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallResetDto {
    pub tick: u64,
    pub serving_player: PlayerSideDto,
}

impl From<ResetOrder> for BallResetDto {
    fn from(order: ResetOrder) -> Self {
        Self {
            tick: order.tick,
            serving_player: order.serving_player.into(),
        }
    }
}

impl From<BallResetDto> for ResetOrder {
    fn from(dto: BallResetDto) -> Self {
        Self {
            tick: dto.tick,
            serving_player: dto.serving_player.into(),
        }
    }
}

impl From<OutboundEvent> for PeerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::Paddle(update) => PeerMessage::Paddle(update.into()),
            OutboundEvent::Toss(ev) => PeerMessage::BallToss(ev.into()),
            OutboundEvent::Serve(ev) => PeerMessage::BallServe(ev.into()),
            OutboundEvent::Hit(ev) => PeerMessage::BallHit(ev.into()),
            OutboundEvent::Out(ev) => PeerMessage::BallOut(ev.into()),
            OutboundEvent::Reset(order) => PeerMessage::BallReset(order.into()),
        }
    }
}

/// Map a decoded peer message onto a session event for the match loop.
/// `Hello` is connection plumbing and maps to nothing.
pub fn to_session_event(message: PeerMessage) -> Option<SessionEvent> {
    let remote = match message {
        PeerMessage::Hello(_) => return None,
        PeerMessage::Paddle(dto) => RemoteEvent::Paddle(dto.into()),
        PeerMessage::BallToss(dto) => RemoteEvent::Toss(dto.into()),
        PeerMessage::BallServe(dto) => RemoteEvent::Serve(dto.into()),
        PeerMessage::BallHit(dto) => RemoteEvent::Hit(dto.into()),
        PeerMessage::BallOut(dto) => RemoteEvent::Out(dto.into()),
        PeerMessage::BallReset(dto) => RemoteEvent::Reset(dto.into()),
    };
    Some(SessionEvent::Remote(remote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_type_and_data_fields() {
        let msg = PeerMessage::from(OutboundEvent::Out(OutEvent {
            tick: 7,
            last_bounce_side: Some(PlayerSide::Right),
            server_side_bounced: true,
        }));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"BallOut\""), "{json}");
        assert!(json.contains("\"data\""), "{json}");
        assert!(json.contains("\"tick\":7"), "{json}");
    }

    #[test]
    fn hit_message_survives_the_wire() {
        let event = BallEvent {
            tick: 99,
            player: PlayerSide::Left,
            pos: Vec3::new(0.1, 1.0, -0.2),
            vel: Vec3::new(4.0, 1.0, 0.0),
            spin: Vec3::new(0.0, 15.0, 0.0),
        };
        let json = serde_json::to_string(&PeerMessage::from(OutboundEvent::Hit(event))).unwrap();
        let decoded: PeerMessage = serde_json::from_str(&json).unwrap();
        let Some(SessionEvent::Remote(RemoteEvent::Hit(hit))) = to_session_event(decoded) else {
            panic!("expected a remote hit");
        };
        assert_eq!(hit.tick, 99);
        assert_eq!(hit.spin, event.spin);
    }

    #[test]
    fn hello_maps_to_no_session_event() {
        let hello = PeerMessage::Hello(HelloPayload {
            side: PlayerSideDto::Right,
        });
        assert!(to_session_event(hello).is_none());
    }
}
