// Peer role, resolved once at session join.

use crate::domain::PlayerSide;

/// Which side this peer plays and whether it is the physics authority for
/// ball-out decisions. The flag never changes during a session, so fault
/// authorship is a cheap capability check rather than per-message trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRole {
    pub side: PlayerSide,
    host: bool,
}

impl SessionRole {
    pub fn host(side: PlayerSide) -> Self {
        Self { side, host: true }
    }

    pub fn guest(side: PlayerSide) -> Self {
        Self { side, host: false }
    }

    pub fn is_host(&self) -> bool {
        self.host
    }

    pub fn remote_side(&self) -> PlayerSide {
        self.side.opposite()
    }

    /// The host's side, which also serves the first point of the match.
    pub fn host_side(&self) -> PlayerSide {
        if self.host { self.side } else { self.side.opposite() }
    }
}
