// Score keeping and point-to-point flow. Runs on the host only; the guest
// hears about resets through the peer channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{FaultReason, PlayerSide};
use crate::use_cases::types::{FaultReport, ResetOrder, SessionEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    fn award(&mut self, winner: PlayerSide) {
        match winner {
            PlayerSide::Left => self.left += 1,
            PlayerSide::Right => self.right += 1,
        }
    }
}

/// Which player lost the point described by `report`.
pub fn point_loser(report: &FaultReport) -> PlayerSide {
    match report.fault.reason {
        // A blown serve is always on the server.
        FaultReason::ServeDropped | FaultReason::ServeFault => report.serving_player,
        // The double bounce happened on somebody's side; that side failed to
        // return the ball.
        FaultReason::DoubleBounce => report
            .fault
            .last_bounce_side
            .unwrap_or(report.serving_player),
        // The last hitter put the ball into the net, the floor, or back onto
        // their own side.
        FaultReason::OwnSideBounce | FaultReason::NetTouch | FaultReason::FloorTouch => {
            report.last_hit.unwrap_or(report.serving_player)
        }
    }
}

/// Consume point verdicts, keep the score, and schedule the next point with
/// the serve handed to the other player.
pub async fn score_task(
    mut fault_rx: mpsc::Receiver<FaultReport>,
    event_tx: mpsc::Sender<SessionEvent>,
    reset_delay: Duration,
    shutdown: Arc<tokio::sync::Notify>,
) {
    let mut score = Score::default();

    loop {
        let report = tokio::select! {
            _ = shutdown.notified() => break,
            report = fault_rx.recv() => match report {
                Some(report) => report,
                None => break,
            },
        };

        let loser = point_loser(&report);
        let winner = loser.opposite();
        score.award(winner);
        info!(
            reason = ?report.fault.reason,
            winner = ?winner,
            left = score.left,
            right = score.right,
            "point scored"
        );

        tokio::time::sleep(reset_delay).await;
        let order = ResetOrder {
            tick: 0,
            serving_player: report.serving_player.opposite(),
        };
        if event_tx.send(SessionEvent::Reset(order)).await.is_err() {
            warn!("match loop gone; stopping score keeper");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Fault;
    use PlayerSide::{Left, Right};

    fn report(
        reason: FaultReason,
        last_bounce_side: Option<PlayerSide>,
        last_hit: Option<PlayerSide>,
        serving_player: PlayerSide,
    ) -> FaultReport {
        FaultReport {
            tick: 100,
            fault: Fault {
                reason,
                last_bounce_side,
                server_side_bounced: true,
            },
            last_hit,
            serving_player,
        }
    }

    #[test]
    fn blown_serves_cost_the_server() {
        let r = report(FaultReason::ServeDropped, None, None, Left);
        assert_eq!(point_loser(&r), Left);
        let r = report(FaultReason::ServeFault, Some(Right), Some(Left), Left);
        assert_eq!(point_loser(&r), Left);
    }

    #[test]
    fn double_bounce_costs_the_side_it_landed_on() {
        let r = report(FaultReason::DoubleBounce, Some(Right), Some(Left), Left);
        assert_eq!(point_loser(&r), Right);
    }

    #[test]
    fn net_floor_and_own_side_cost_the_last_hitter() {
        for reason in [
            FaultReason::NetTouch,
            FaultReason::FloorTouch,
            FaultReason::OwnSideBounce,
        ] {
            let r = report(reason, Some(Left), Some(Right), Left);
            assert_eq!(point_loser(&r), Right, "{reason:?}");
        }
    }

    #[tokio::test]
    async fn score_task_flips_the_serve_on_reset() {
        let (fault_tx, fault_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let shutdown = Arc::new(tokio::sync::Notify::new());
        let handle = tokio::spawn(score_task(
            fault_rx,
            event_tx,
            Duration::from_millis(1),
            shutdown.clone(),
        ));

        fault_tx
            .send(report(FaultReason::NetTouch, Some(Right), Some(Left), Left))
            .await
            .expect("send verdict");

        let event = event_rx.recv().await.expect("a reset");
        let SessionEvent::Reset(order) = event else {
            panic!("expected a reset, got {event:?}");
        };
        assert_eq!(order.serving_player, Right);

        shutdown.notify_one();
        handle.await.expect("clean shutdown");
    }
}
