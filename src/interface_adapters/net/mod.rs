pub mod guest;
pub mod host;
pub mod serializer;

pub use guest::{connect, run_bridge};
pub use host::ws_handler;
pub use serializer::outbound_serializer;

/// Categorizes connection lifecycle failures so callers can decide policy.
#[derive(Debug)]
pub enum NetError {
    Ws(axum::Error),
    Tungstenite(tokio_tungstenite::tungstenite::Error),
    Serialization(serde_json::Error),
    EventsClosed,
    OutboundClosed,
    HelloRequired,
    HelloTimeout,
    ClosedBeforePlay,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for NetError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        NetError::Tungstenite(e)
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Serialization(e)
    }
}
