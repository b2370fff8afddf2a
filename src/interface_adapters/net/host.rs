// Host side of the peer link: a single-route axum WebSocket endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::interface_adapters::net::NetError;
use crate::interface_adapters::protocol::{self, HelloPayload, PeerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::conn_id;
use crate::use_cases::SessionEvent;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Correlate all logs for this connection under one span.
    let span = info_span!("conn", conn_id = conn_id());
    peer_connection(socket, state).instrument(span).await;
}

async fn peer_connection(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before any await so no outbound message is missed.
    let mut bytes_rx = state.outbound_bytes_tx.subscribe();

    // The handshake assigns the guest the opposite side.
    let hello = PeerMessage::Hello(HelloPayload {
        side: state.role.remote_side().into(),
    });
    if let Err(e) = send_message(&mut socket, &hello).await {
        error!(error = ?e, "failed to send hello");
        let _ = socket.close().await;
        return;
    }

    if state
        .event_tx
        .send(SessionEvent::PeerJoined {
            side: state.role.remote_side(),
        })
        .await
        .is_err()
    {
        error!("match loop gone; refusing connection");
        let _ = socket.close().await;
        return;
    }
    info!(side = ?state.role.remote_side(), "peer connected");

    if let Err(e) = run_peer_loop(&mut socket, &state, &mut bytes_rx).await {
        warn!(error = ?e, "peer loop exited with error");
    }

    let _ = state.event_tx.send(SessionEvent::PeerLeft).await;
    info!("peer disconnected");
}

async fn send_message(socket: &mut WebSocket, msg: &PeerMessage) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)
}

async fn run_peer_loop(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    bytes_rx: &mut broadcast::Receiver<String>,
) -> Result<(), NetError> {
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        forward_peer_text(&text, state)?;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::UNSUPPORTED,
                                reason: "binary messages not supported".into(),
                            })))
                            .await;
                        return Ok(());
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket recv error");
                        return Ok(());
                    }
                }
            }
            outgoing = bytes_rx.recv() => {
                match outgoing {
                    Ok(txt) => {
                        socket
                            .send(Message::Text(txt.into()))
                            .await
                            .map_err(NetError::Ws)?;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Stale paddle poses are superseded within a tick or
                        // two, so skipping ahead is safe.
                        warn!(missed = n, "outbound stream lagged; skipping");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(NetError::OutboundClosed);
                    }
                }
            }
        }
    }
}

fn forward_peer_text(text: &str, state: &Arc<AppState>) -> Result<(), NetError> {
    let message = match serde_json::from_str::<PeerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(bytes = text.len(), error = %e, "failed to parse peer message");
            return Ok(());
        }
    };
    let Some(event) = protocol::to_session_event(message) else {
        debug!("ignoring hello from guest");
        return Ok(());
    };
    match state.event_tx.try_send(event) {
        Ok(()) => Ok(()),
        Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
            warn!("event channel full; dropping peer message");
            Ok(())
        }
        Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => Err(NetError::EventsClosed),
    }
}
