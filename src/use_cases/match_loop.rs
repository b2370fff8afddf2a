// The match loop: fixed-step simulation driven by a tokio interval, with all
// inputs funneled through one event channel.
//
// `MatchSim` is the synchronous core; `match_task` owns the channels and the
// accumulator clock around it. Tests drive `MatchSim` directly.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::tuning::{PaddleTuning, StrikeTuning};
use crate::domain::{
    BallState, CollisionEvent, Fault, PaddleContact, PlayerSide, RallyPhase, RallyState,
    RemotePaddle, RigidBodyWorld, RollbackManager, resolve_paddle_contact,
};
use crate::use_cases::session::SessionRole;
use crate::use_cases::types::{
    BallEvent, FaultReport, OutEvent, OutboundEvent, PaddleUpdate, RemoteEvent, RenderFrame,
    ResetOrder, SessionEvent, TossEvent,
};

/// Paddle pose broadcast cadence, in physics ticks.
const PADDLE_SYNC_DIVISOR: u64 = 2;
/// Oldest authoritative event (in ticks behind) still worth replaying.
const ROLLBACK_HORIZON_TICKS: u64 = 10;
/// One second of ball history at the fixed tick rate.
const HISTORY_CAPACITY: usize = 60;

/// The whole match simulation for one peer. Both peers run the full physics;
/// only the host's rally machine is allowed to end points.
pub struct MatchSim {
    role: SessionRole,
    world: RigidBodyWorld,
    rally: RallyState,
    rollback: RollbackManager,
    remote_paddle: RemotePaddle,
    strike_cfg: StrikeTuning,
    paddle_cfg: PaddleTuning,
    tick: u64,
    prev_ball: Option<BallState>,
}

impl MatchSim {
    pub fn new(role: SessionRole, dt: f32) -> Self {
        let world = RigidBodyWorld::new(dt);
        // The host's side serves the first point of the match.
        let serving = role.host_side();
        let remote_side = role.remote_side();
        let remote_paddle = RemotePaddle::new(world.paddle_rest(remote_side), remote_side);

        let mut sim = Self {
            role,
            world,
            rally: RallyState::new(serving),
            rollback: RollbackManager::new(HISTORY_CAPACITY, ROLLBACK_HORIZON_TICKS),
            remote_paddle,
            strike_cfg: StrikeTuning::default(),
            paddle_cfg: PaddleTuning::default(),
            tick: 0,
            prev_ball: None,
        };
        sim.place_held_ball(serving);
        sim
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn phase(&self) -> RallyPhase {
        self.rally.phase
    }

    pub fn ball(&self) -> Option<&BallState> {
        self.world.ball()
    }

    /// Feed one session event into the simulation. Outbound peer messages are
    /// appended to `out`.
    pub fn handle_event(&mut self, event: SessionEvent, out: &mut Vec<OutboundEvent>) {
        match event {
            SessionEvent::PeerJoined { side } => {
                info!(side = ?side, "peer joined the match");
            }
            SessionEvent::PeerLeft => {
                info!("peer left; holding the ball until they return");
                self.world.freeze_ball();
                self.world.set_apply_spin(false);
            }
            SessionEvent::PaddleInput { target, rot_z } => {
                self.world.set_paddle_target(self.role.side, target, rot_z);
            }
            SessionEvent::ServeToss => self.handle_serve_toss(out),
            SessionEvent::Reset(order) => {
                self.apply_reset(order);
                if self.role.is_host() {
                    out.push(OutboundEvent::Reset(order));
                }
            }
            SessionEvent::Remote(remote) => self.handle_remote(remote),
        }
    }

    fn handle_serve_toss(&mut self, out: &mut Vec<OutboundEvent>) {
        let held = self.world.ball().is_some_and(|b| b.frozen);
        let my_serve = self.rally.phase == RallyPhase::WaitingForServe
            && self.rally.serving_player == self.role.side;
        if !(held && my_serve) {
            return;
        }

        let toss_speed = self.world.ball_tuning().toss_speed;
        self.world.release_ball(Vec3::Y * toss_speed);
        if let Some(ball) = self.world.ball() {
            out.push(OutboundEvent::Toss(TossEvent {
                tick: self.tick,
                player: self.role.side,
                pos: ball.pos,
                vel: ball.vel,
            }));
        }
    }

    fn handle_remote(&mut self, remote: RemoteEvent) {
        match remote {
            RemoteEvent::Paddle(update) => {
                self.remote_paddle.apply_update(update.pos, update.rot_z, update.vel);
            }
            RemoteEvent::Serve(ev) => {
                // The serve also synchronizes tick counters between peers, so
                // a future event tick is adopted here and nowhere else.
                let (tick, outcome) = self.reconcile(ev, true);
                self.tick = tick;
                debug!(?outcome, player = ?ev.player, "remote serve reconciled");
                self.rally.register_serve(ev.player);
                self.world.set_apply_spin(false);
            }
            RemoteEvent::Hit(ev) => {
                let (tick, outcome) = self.reconcile(ev, false);
                self.tick = tick;
                debug!(?outcome, player = ?ev.player, "remote hit reconciled");
                self.rally.register_hit(ev.player);
                self.world.set_apply_spin(true);
            }
            RemoteEvent::Toss(ev) => {
                self.world
                    .set_ball_state(BallState::moving(ev.pos, ev.vel));
            }
            RemoteEvent::Out(ev) => {
                debug!(tick = ev.tick, "point ended by peer verdict");
                self.rally.mirror_point_ended();
                self.world.freeze_ball();
                self.world.set_apply_spin(false);
                self.rollback.clear();
            }
            RemoteEvent::Reset(order) => self.apply_reset(order),
        }
    }

    fn reconcile(
        &mut self,
        ev: BallEvent,
        adopt_tick: bool,
    ) -> (u64, crate::domain::Reconciliation) {
        let state = BallState {
            pos: ev.pos,
            vel: ev.vel,
            spin: ev.spin,
            frozen: false,
        };
        self.rollback
            .reconcile(&mut self.world, self.tick, ev.tick, state, adopt_tick)
    }

    /// Advance one fixed timestep. Outbound peer messages go to `out`, point
    /// verdicts for the score keeper to `faults`.
    pub fn step(&mut self, out: &mut Vec<OutboundEvent>, faults: &mut Vec<FaultReport>) {
        self.prev_ball = self.world.ball().copied();

        let dt = self.world.tick_dt();
        let pose = self.remote_paddle.step(dt, &self.paddle_cfg);
        self.world
            .set_paddle_target(self.remote_paddle.side(), pose.pos, pose.rot_z);

        let events = self.world.step();
        self.tick += 1;

        for event in events {
            match event {
                CollisionEvent::BallPaddle { side } => self.on_paddle_contact(side, out),
                CollisionEvent::BallTable { side } => {
                    if self.role.is_host() {
                        if let Some(fault) = self.rally.judge_table_bounce(side) {
                            self.end_point(fault, out, faults);
                        }
                    } else {
                        self.rally.record_bounce(side);
                    }
                }
                CollisionEvent::BallNet => {
                    if self.role.is_host() {
                        if let Some(fault) = self.rally.judge_net_touch() {
                            self.end_point(fault, out, faults);
                        }
                    }
                }
                CollisionEvent::BallFloor => {
                    if self.role.is_host() {
                        if let Some(fault) = self.rally.judge_floor_touch() {
                            self.end_point(fault, out, faults);
                        }
                    }
                }
            }
        }

        if self.rally.phase == RallyPhase::InPlay {
            if let Some(ball) = self.world.ball() {
                self.rollback.record(self.tick, ball);
            }
        }

        if self.tick % PADDLE_SYNC_DIVISOR == 0 {
            let paddle = self.world.paddle(self.role.side);
            out.push(OutboundEvent::Paddle(PaddleUpdate {
                side: self.role.side,
                pos: paddle.pos,
                rot_z: paddle.rot_z,
                vel: paddle.vel,
            }));
        }
    }

    /// Both paddles are resolved locally for prediction; only contacts with
    /// the local paddle produce an outbound message.
    fn on_paddle_contact(&mut self, side: PlayerSide, out: &mut Vec<OutboundEvent>) {
        let contact =
            resolve_paddle_contact(&mut self.world, &mut self.rally, side, &self.strike_cfg);
        if side != self.role.side {
            return;
        }
        match contact {
            PaddleContact::Serve { ball } => out.push(OutboundEvent::Serve(BallEvent {
                tick: self.tick,
                player: side,
                pos: ball.pos,
                vel: ball.vel,
                spin: ball.spin,
            })),
            PaddleContact::Rally { ball, .. } => out.push(OutboundEvent::Hit(BallEvent {
                tick: self.tick,
                player: side,
                pos: ball.pos,
                vel: ball.vel,
                spin: ball.spin,
            })),
            PaddleContact::Ignored => {}
        }
    }

    fn end_point(
        &mut self,
        fault: Fault,
        out: &mut Vec<OutboundEvent>,
        faults: &mut Vec<FaultReport>,
    ) {
        info!(reason = ?fault.reason, tick = self.tick, "point ended");
        out.push(OutboundEvent::Out(OutEvent {
            tick: self.tick,
            last_bounce_side: fault.last_bounce_side,
            server_side_bounced: fault.server_side_bounced,
        }));
        faults.push(FaultReport {
            tick: self.tick,
            fault,
            last_hit: self.rally.last_hit,
            serving_player: self.rally.serving_player,
        });
        self.world.freeze_ball();
        self.world.set_apply_spin(false);
        self.rollback.clear();
    }

    fn apply_reset(&mut self, order: ResetOrder) {
        info!(serving = ?order.serving_player, tick = order.tick, "resetting for next point");
        self.rally.reset(order.serving_player);
        self.tick = order.tick;
        self.rollback.clear();
        self.place_held_ball(order.serving_player);
        self.prev_ball = None;
    }

    fn place_held_ball(&mut self, serving: PlayerSide) {
        let anchor = self.world.serve_anchor(serving);
        self.world.spawn_ball(BallState::held_at(anchor));
        self.world.set_apply_spin(false);
    }

    pub fn render_frame(&self, alpha: f32) -> RenderFrame {
        RenderFrame::compose(
            self.tick,
            alpha,
            self.rally.phase,
            self.prev_ball.as_ref(),
            self.world.ball(),
            [
                self.world.paddle(PlayerSide::Left),
                self.world.paddle(PlayerSide::Right),
            ],
        )
    }

    #[cfg(test)]
    fn world_mut(&mut self) -> &mut RigidBodyWorld {
        &mut self.world
    }
}

pub struct MatchLoopDeps {
    pub role: SessionRole,
    pub event_rx: mpsc::Receiver<SessionEvent>,
    pub outbound_tx: mpsc::Sender<OutboundEvent>,
    pub fault_tx: mpsc::Sender<FaultReport>,
    pub frame_tx: watch::Sender<RenderFrame>,
    pub tick_interval: Duration,
    pub shutdown: Arc<tokio::sync::Notify>,
}

/// Drive the fixed-step match loop at the configured tick rate. Wall-clock
/// time is accumulated and consumed in whole physics steps; the leftover
/// fraction is published as the render interpolation alpha.
pub async fn match_task(mut deps: MatchLoopDeps) {
    let dt = deps.tick_interval.as_secs_f32();
    let mut sim = MatchSim::new(deps.role, dt);
    let mut out: Vec<OutboundEvent> = Vec::new();
    let mut faults: Vec<FaultReport> = Vec::new();

    let mut interval = tokio::time::interval(deps.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut accumulator: f32 = 0.0;

    loop {
        tokio::select! {
            _ = deps.shutdown.notified() => {
                info!("match loop shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        // Cap the frame delta so a long stall cannot trigger a step avalanche.
        let now = Instant::now();
        accumulator += (now - last).as_secs_f32().min(0.25);
        last = now;

        while let Ok(event) = deps.event_rx.try_recv() {
            sim.handle_event(event, &mut out);
        }

        while accumulator >= dt {
            sim.step(&mut out, &mut faults);
            accumulator -= dt;
        }

        for event in out.drain(..) {
            if deps.outbound_tx.try_send(event).is_err() {
                warn!("outbound channel full; dropping peer message");
            }
        }
        for report in faults.drain(..) {
            if deps.fault_tx.try_send(report).is_err() {
                warn!("fault channel full; dropping point verdict");
            }
        }

        let _ = deps.frame_tx.send(sim.render_frame(accumulator / dt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerSide::{Left, Right};

    const DT: f32 = 1.0 / 60.0;

    fn host_sim() -> MatchSim {
        MatchSim::new(SessionRole::host(Left), DT)
    }

    fn serve_as_host(sim: &mut MatchSim, out: &mut Vec<OutboundEvent>) {
        let mut faults = Vec::new();
        sim.handle_event(SessionEvent::ServeToss, out);
        // Drop the tossed ball straight onto the server's paddle.
        let paddle_pos = sim.world_mut().paddle(Left).pos;
        sim.world_mut()
            .set_ball_state(BallState::moving(paddle_pos, Vec3::new(0.0, -1.0, 0.0)));
        sim.step(out, &mut faults);
        assert!(faults.is_empty());
    }

    #[test]
    fn toss_is_refused_for_the_non_server() {
        let mut sim = MatchSim::new(SessionRole::guest(Right), DT);
        let mut out = Vec::new();
        sim.handle_event(SessionEvent::ServeToss, &mut out);
        assert!(out.is_empty());
        assert!(sim.ball().unwrap().frozen);
    }

    #[test]
    fn toss_releases_the_ball_and_notifies_the_peer() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        sim.handle_event(SessionEvent::ServeToss, &mut out);
        assert!(matches!(out.as_slice(), [OutboundEvent::Toss(_)]));
        let ball = sim.ball().unwrap();
        assert!(!ball.frozen);
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn serve_strike_emits_a_serve_event_and_goes_in_play() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        serve_as_host(&mut sim, &mut out);
        assert_eq!(sim.phase(), RallyPhase::InPlay);
        assert!(
            out.iter().any(|e| matches!(e, OutboundEvent::Serve(_))),
            "out: {out:?}"
        );
    }

    #[test]
    fn host_judges_a_double_bounce() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        serve_as_host(&mut sim, &mut out);

        let surface = sim.world_mut().table_tuning().height;
        let mut faults = Vec::new();
        // Legal first bounce on the server's side, then a second on the same
        // side without the ball ever crossing.
        for _ in 0..2 {
            sim.world_mut().set_ball_state(BallState::moving(
                Vec3::new(-0.5, surface + 0.05, 0.0),
                Vec3::new(0.0, -2.0, 0.0),
            ));
            let mut steps = 0;
            while faults.is_empty() && sim.phase() == RallyPhase::InPlay && steps < 10 {
                sim.step(&mut out, &mut faults);
                steps += 1;
            }
            if !faults.is_empty() {
                break;
            }
        }

        let report = faults.first().expect("a fault verdict");
        assert_eq!(
            report.fault.reason,
            crate::domain::FaultReason::DoubleBounce
        );
        assert_eq!(sim.phase(), RallyPhase::PointEnded);
        assert!(sim.ball().unwrap().frozen);
        assert!(out.iter().any(|e| matches!(e, OutboundEvent::Out(_))));
    }

    #[test]
    fn guest_never_authors_a_verdict() {
        let mut sim = MatchSim::new(SessionRole::guest(Right), DT);
        let mut out = Vec::new();
        let mut faults = Vec::new();

        // The remote host serves; the guest mirrors it into play.
        sim.handle_event(
            SessionEvent::Remote(RemoteEvent::Serve(BallEvent {
                tick: sim.tick(),
                player: Left,
                pos: Vec3::new(-1.2, 1.0, 0.0),
                vel: Vec3::new(3.0, 1.0, 0.0),
                spin: Vec3::ZERO,
            })),
            &mut out,
        );
        assert_eq!(sim.phase(), RallyPhase::InPlay);

        // Drop the ball to the floor; the guest keeps simulating but issues
        // no verdict.
        sim.world_mut().set_ball_state(BallState::moving(
            Vec3::new(2.5, 0.3, 0.0),
            Vec3::new(0.0, -3.0, 0.0),
        ));
        for _ in 0..30 {
            sim.step(&mut out, &mut faults);
        }
        assert!(faults.is_empty());
        assert!(!out.iter().any(|e| matches!(e, OutboundEvent::Out(_))));
        assert_eq!(sim.phase(), RallyPhase::InPlay);
    }

    #[test]
    fn remote_out_freezes_and_mirrors_the_verdict() {
        let mut sim = MatchSim::new(SessionRole::guest(Right), DT);
        let mut out = Vec::new();
        sim.handle_event(
            SessionEvent::Remote(RemoteEvent::Out(OutEvent {
                tick: 40,
                last_bounce_side: Some(Right),
                server_side_bounced: true,
            })),
            &mut out,
        );
        assert_eq!(sim.phase(), RallyPhase::PointEnded);
        assert!(sim.ball().unwrap().frozen);
    }

    #[test]
    fn reset_rearms_the_serve_for_the_named_player() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        serve_as_host(&mut sim, &mut out);

        out.clear();
        sim.handle_event(
            SessionEvent::Reset(ResetOrder {
                tick: 0,
                serving_player: Right,
            }),
            &mut out,
        );
        assert_eq!(sim.phase(), RallyPhase::WaitingForServe);
        assert_eq!(sim.tick(), 0);
        let ball = sim.ball().unwrap();
        assert!(ball.frozen);
        assert!(ball.pos.x > 0.0, "held on Right's side: {}", ball.pos.x);
        // The host echoes the reset to the peer.
        assert!(matches!(out.as_slice(), [OutboundEvent::Reset(_)]));
    }

    #[test]
    fn paddle_pose_is_broadcast_every_other_tick() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        let mut faults = Vec::new();
        for _ in 0..4 {
            sim.step(&mut out, &mut faults);
        }
        let updates = out
            .iter()
            .filter(|e| matches!(e, OutboundEvent::Paddle(_)))
            .count();
        assert_eq!(updates, 2);
    }

    #[test]
    fn remote_hit_rolls_the_ball_back_to_authoritative_state() {
        let mut sim = host_sim();
        let mut out = Vec::new();
        serve_as_host(&mut sim, &mut out);
        let mut faults = Vec::new();
        for _ in 0..6 {
            sim.step(&mut out, &mut faults);
        }

        let local_tick = sim.tick();
        sim.handle_event(
            SessionEvent::Remote(RemoteEvent::Hit(BallEvent {
                tick: local_tick - 3,
                player: Right,
                pos: Vec3::new(0.8, 1.0, 0.0),
                vel: Vec3::new(-4.0, 1.5, 0.0),
                spin: Vec3::new(0.0, 10.0, 0.0),
            })),
            &mut out,
        );
        // Local tick is preserved; the ball has been replayed forward, so it
        // sits ahead of the event position along -X.
        assert_eq!(sim.tick(), local_tick);
        assert!(sim.ball().unwrap().pos.x < 0.8);
        assert_eq!(sim.phase(), RallyPhase::InPlay);
    }

    #[tokio::test]
    async fn match_task_publishes_frames_and_stops_on_shutdown() {
        let (_event_tx, event_rx) = mpsc::channel(64);
        let (outbound_tx, _outbound_rx) = mpsc::channel(64);
        let (fault_tx, _fault_rx) = mpsc::channel(16);
        let (frame_tx, mut frame_rx) = watch::channel(RenderFrame::default());
        let shutdown = Arc::new(tokio::sync::Notify::new());

        let handle = tokio::spawn(match_task(MatchLoopDeps {
            role: SessionRole::host(Left),
            event_rx,
            outbound_tx,
            fault_tx,
            frame_tx,
            tick_interval: Duration::from_millis(5),
            shutdown: shutdown.clone(),
        }));

        frame_rx.changed().await.expect("a frame");
        tokio::time::sleep(Duration::from_millis(30)).await;
        frame_rx.changed().await.expect("another frame");
        assert!(frame_rx.borrow().tick > 0);

        shutdown.notify_one();
        handle.await.expect("clean shutdown");
    }
}
