// Guest side of the peer link: an outbound WebSocket connection to the host.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::domain::PlayerSide;
use crate::interface_adapters::net::NetError;
use crate::interface_adapters::protocol::{self, PeerMessage};
use crate::use_cases::SessionEvent;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to the host and complete the hello handshake. The returned side is
/// the one the host assigned to this peer.
pub async fn connect(url: &str, hello_timeout: Duration) -> Result<(WsStream, PlayerSide), NetError> {
    let (mut stream, _response) = connect_async(url).await?;
    info!(url, "connected to host; waiting for hello");

    let side = match timeout(hello_timeout, read_hello(&mut stream)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = stream.close(None).await;
            return Err(NetError::HelloTimeout);
        }
    };
    info!(side = ?side, "host assigned our side");
    Ok((stream, side))
}

async fn read_hello(stream: &mut WsStream) -> Result<PlayerSide, NetError> {
    while let Some(incoming) = stream.next().await {
        match incoming? {
            Message::Text(text) => {
                return match serde_json::from_str::<PeerMessage>(&text)? {
                    PeerMessage::Hello(hello) => Ok(hello.side.into()),
                    // The host always speaks hello first; anything else means
                    // we connected to something that is not a match host.
                    _ => Err(NetError::HelloRequired),
                };
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforePlay),
            _ => return Err(NetError::HelloRequired),
        }
    }
    Err(NetError::ClosedBeforePlay)
}

/// Bridge the socket and the match loop until either side closes.
pub async fn run_bridge(
    mut stream: WsStream,
    event_tx: mpsc::Sender<SessionEvent>,
    mut bytes_rx: broadcast::Receiver<String>,
    shutdown: Arc<tokio::sync::Notify>,
) -> Result<(), NetError> {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                let _ = stream.close(None).await;
                return Ok(());
            }
            outgoing = bytes_rx.recv() => {
                match outgoing {
                    Ok(txt) => stream.send(Message::Text(txt)).await?,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "outbound stream lagged; skipping");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(NetError::OutboundClosed);
                    }
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        forward_host_text(&text, &event_tx).await?;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        info!("host closed the connection");
                        let _ = event_tx.send(SessionEvent::PeerLeft).await;
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket recv error");
                        let _ = event_tx.send(SessionEvent::PeerLeft).await;
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

async fn forward_host_text(
    text: &str,
    event_tx: &mpsc::Sender<SessionEvent>,
) -> Result<(), NetError> {
    let message = match serde_json::from_str::<PeerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(bytes = text.len(), error = %e, "failed to parse host message");
            return Ok(());
        }
    };
    let Some(event) = protocol::to_session_event(message) else {
        debug!("ignoring repeated hello");
        return Ok(());
    };
    match event_tx.try_send(event) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("event channel full; dropping host message");
            Ok(())
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::EventsClosed),
    }
}
