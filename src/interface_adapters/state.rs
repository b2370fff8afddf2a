use tokio::sync::{broadcast, mpsc};

use crate::use_cases::{SessionEvent, SessionRole};

#[derive(Clone)]
pub struct AppState {
    // Session events flowing from the network into the match loop.
    pub event_tx: mpsc::Sender<SessionEvent>,
    // Serialized outbound messages, shared with the active peer connection.
    pub outbound_bytes_tx: broadcast::Sender<String>,
    // This peer's role; the remote peer plays the opposite side.
    pub role: SessionRole,
}
