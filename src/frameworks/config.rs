use std::{env, time::Duration};

use crate::domain::PlayerSide;

// Runtime/session constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("PINGPONG_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// WebSocket URL of the host peer, used by the guest role.
pub fn peer_url() -> String {
    env::var("PINGPONG_PEER_URL").unwrap_or_else(|_| "ws://127.0.0.1:3001/ws".to_string())
}

/// Which side the host plays. The guest is assigned the opposite side during
/// the hello handshake.
pub fn host_side() -> PlayerSide {
    match env::var("PINGPONG_HOST_SIDE").as_deref() {
        Ok("right") | Ok("Right") => PlayerSide::Right,
        _ => PlayerSide::Left,
    }
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;
pub const OUTBOUND_BROADCAST_CAPACITY: usize = 128;
pub const FAULT_CHANNEL_CAPACITY: usize = 16;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

pub const HELLO_TIMEOUT: Duration = Duration::from_secs(5);
// Pause between a point verdict and the next serve being armed.
pub const RESET_DELAY: Duration = Duration::from_secs(2);
