use tokio::sync::{broadcast, mpsc};
use tracing::{error, warn};

use crate::interface_adapters::protocol::PeerMessage;
use crate::use_cases::OutboundEvent;

/// Serialize each outbound event once and hand the shared text to the active
/// peer connection. Send errors mean no connection is listening, which is
/// normal between joins.
pub async fn outbound_serializer(
    mut outbound_rx: mpsc::Receiver<OutboundEvent>,
    bytes_tx: broadcast::Sender<String>,
) {
    while let Some(event) = outbound_rx.recv().await {
        let msg = PeerMessage::from(event);
        let txt = match serde_json::to_string(&msg) {
            Ok(txt) => txt,
            Err(e) => {
                error!(error = ?e, "failed to serialize outbound message");
                continue;
            }
        };
        let _ = bytes_tx.send(txt);
    }
    warn!("outbound channel closed; serializer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerSide;
    use crate::use_cases::ResetOrder;

    #[tokio::test]
    async fn serializes_events_into_the_broadcast() {
        let (outbound_tx, outbound_rx) = mpsc::channel(4);
        let (bytes_tx, mut bytes_rx) = broadcast::channel(4);
        let handle = tokio::spawn(outbound_serializer(outbound_rx, bytes_tx));

        outbound_tx
            .send(OutboundEvent::Reset(ResetOrder {
                tick: 0,
                serving_player: PlayerSide::Right,
            }))
            .await
            .expect("send event");

        let txt = bytes_rx.recv().await.expect("serialized text");
        assert!(txt.contains("\"type\":\"BallReset\""), "{txt}");

        drop(outbound_tx);
        handle.await.expect("serializer exits when input closes");
    }
}
