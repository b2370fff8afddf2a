// Network reconciliation: snap to an authoritative ball state and re-simulate
// forward to the local tick.
//
// Re-simulation calls the same fixed step as live play but the caller never
// forwards the returned collision events, so a replayed hit cannot emit a
// second network message.

use tracing::{debug, warn};

use crate::domain::ball::BallState;
use crate::domain::history::{HistorySnapshot, SnapshotRing};
use crate::domain::world::RigidBodyWorld;

/// What `reconcile` did with an authoritative event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Event tick matched the local tick; state applied directly.
    Applied,
    /// Event was older than local: state snapped back and `steps` fixed steps
    /// replayed to catch up.
    Replayed { steps: u64 },
    /// Drift at or beyond the horizon: state applied directly, no replay.
    Snapped { drift: u64 },
    /// Event was newer than local; state applied and (optionally) the local
    /// tick fast-forwarded to the event tick.
    FastForwarded { from: u64 },
}

pub struct RollbackManager {
    history: SnapshotRing,
    horizon: u64,
}

impl RollbackManager {
    pub fn new(history_capacity: usize, horizon: u64) -> Self {
        Self {
            history: SnapshotRing::new(history_capacity),
            horizon,
        }
    }

    /// Record the ball state for `tick`. Called once per tick while the rally
    /// is live.
    pub fn record(&mut self, tick: u64, ball: &BallState) {
        self.history.push(HistorySnapshot::of(tick, ball));
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &SnapshotRing {
        &self.history
    }

    /// Reconcile an authoritative ball state stamped `event_tick` against the
    /// local simulation at `local_tick`. Returns the (possibly fast-forwarded)
    /// local tick and what was done.
    ///
    /// `adopt_tick` opts into adopting a future event tick as the local tick;
    /// only serve-time synchronization wants that.
    pub fn reconcile(
        &mut self,
        world: &mut RigidBodyWorld,
        local_tick: u64,
        event_tick: u64,
        state: BallState,
        adopt_tick: bool,
    ) -> (u64, Reconciliation) {
        if event_tick == local_tick {
            world.set_ball_state(state);
            return (local_tick, Reconciliation::Applied);
        }

        if event_tick > local_tick {
            world.set_ball_state(state);
            self.history.purge_after(event_tick);
            if adopt_tick {
                debug!(local_tick, event_tick, "adopting authoritative tick");
                return (event_tick, Reconciliation::FastForwarded { from: local_tick });
            }
            return (local_tick, Reconciliation::Applied);
        }

        let drift = local_tick - event_tick;
        if drift >= self.horizon {
            // Too far gone to replay; take the authoritative state as-is and
            // let the next exchange converge.
            warn!(
                local_tick,
                event_tick, drift, "tick drift beyond rollback horizon; snapping"
            );
            world.set_ball_state(state);
            self.history.clear();
            return (local_tick, Reconciliation::Snapped { drift });
        }

        world.set_ball_state(state);
        self.history.purge_after(event_tick);
        for tick in (event_tick + 1)..=local_tick {
            // Collision events from the replay are dropped here by design.
            let _ = world.step();
            if let Some(ball) = world.ball() {
                self.history.push(HistorySnapshot::of(tick, ball));
            }
        }
        debug!(local_tick, event_tick, steps = drift, "rolled back and replayed");
        (local_tick, Reconciliation::Replayed { steps: drift })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn flying_ball() -> BallState {
        BallState::moving(Vec3::new(-0.8, 1.1, 0.0), Vec3::new(4.0, 1.5, 0.2))
    }

    #[test]
    fn equal_tick_applies_directly() {
        let mut world = RigidBodyWorld::new(DT);
        world.spawn_ball(flying_ball());
        let mut manager = RollbackManager::new(60, 10);

        let authoritative = BallState::moving(Vec3::new(0.3, 1.0, 0.0), Vec3::new(-2.0, 0.5, 0.0));
        let (tick, outcome) = manager.reconcile(&mut world, 42, 42, authoritative, false);
        assert_eq!(tick, 42);
        assert_eq!(outcome, Reconciliation::Applied);
        assert_eq!(world.ball().unwrap().pos, authoritative.pos);
    }

    #[test]
    fn older_event_within_horizon_replays_to_local_tick() {
        let mut world = RigidBodyWorld::new(DT);
        world.spawn_ball(flying_ball());
        let mut manager = RollbackManager::new(60, 10);
        for tick in 0..=120 {
            let _ = world.step();
            manager.record(tick, world.ball().unwrap());
        }

        let authoritative = BallState::moving(Vec3::new(0.0, 1.2, 0.0), Vec3::new(3.0, 1.0, 0.0));
        let (tick, outcome) = manager.reconcile(&mut world, 120, 115, authoritative, false);
        assert_eq!(tick, 120, "local tick is preserved");
        assert_eq!(outcome, Reconciliation::Replayed { steps: 5 });
        assert_eq!(manager.history().latest().unwrap().tick, 120);
    }

    #[test]
    fn replay_matches_uninterrupted_simulation() {
        // Simulate T..C without interruption.
        let state_at_t = BallState::moving(Vec3::new(-0.5, 1.0, 0.1), Vec3::new(3.5, 2.0, -0.1));
        let mut reference = RigidBodyWorld::new(DT);
        reference.spawn_ball(state_at_t);
        for _ in 0..8 {
            let _ = reference.step();
        }

        // Diverge a second world, then reconcile it back to the same state.
        let mut world = RigidBodyWorld::new(DT);
        world.spawn_ball(BallState::moving(
            Vec3::new(0.9, 0.9, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ));
        for _ in 0..8 {
            let _ = world.step();
        }
        let mut manager = RollbackManager::new(60, 10);
        let (_, outcome) = manager.reconcile(&mut world, 8, 0, state_at_t, false);

        assert_eq!(outcome, Reconciliation::Replayed { steps: 8 });
        assert_eq!(world.ball().unwrap().pos, reference.ball().unwrap().pos);
    }

    #[test]
    fn drift_beyond_horizon_snaps_without_replay() {
        let mut world = RigidBodyWorld::new(DT);
        world.spawn_ball(flying_ball());
        let mut manager = RollbackManager::new(60, 10);

        let authoritative = BallState::moving(Vec3::new(0.2, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let (tick, outcome) = manager.reconcile(&mut world, 50, 40, authoritative, false);
        assert_eq!(tick, 50);
        assert_eq!(outcome, Reconciliation::Snapped { drift: 10 });
        // State is exactly the received one, untouched by any replay step.
        assert_eq!(*world.ball().unwrap(), authoritative);
    }

    #[test]
    fn future_event_fast_forwards_only_when_asked() {
        let mut world = RigidBodyWorld::new(DT);
        world.spawn_ball(flying_ball());
        let mut manager = RollbackManager::new(60, 10);
        let state = flying_ball();

        let (tick, outcome) = manager.reconcile(&mut world, 5, 30, state, false);
        assert_eq!((tick, outcome), (5, Reconciliation::Applied));

        let (tick, outcome) = manager.reconcile(&mut world, 5, 30, state, true);
        assert_eq!(tick, 30);
        assert_eq!(outcome, Reconciliation::FastForwarded { from: 5 });
    }
}
