// End-to-end exercises of the match core: two simulations exchanging real
// protocol messages, and the full task/socket stack.

use std::time::Duration;

use axum::{Router, routing::get};
use glam::Vec3;

use pingpong::domain::{PlayerSide, RallyPhase};
use pingpong::frameworks::server::build_session;
use pingpong::interface_adapters::net;
use pingpong::interface_adapters::protocol::{PeerMessage, to_session_event};
use pingpong::use_cases::{MatchSim, OutboundEvent, SessionEvent, SessionRole};

const DT: f32 = 1.0 / 60.0;

/// Deliver one sim's outbound messages to the other through the real wire
/// format, including the JSON round trip.
fn pump(from: &mut Vec<OutboundEvent>, to: &mut MatchSim, to_out: &mut Vec<OutboundEvent>) {
    for event in from.drain(..) {
        let json = serde_json::to_string(&PeerMessage::from(event)).expect("serialize");
        let message: PeerMessage = serde_json::from_str(&json).expect("deserialize");
        if let Some(session_event) = to_session_event(message) {
            to.handle_event(session_event, to_out);
        }
    }
}

#[test]
fn dropped_serve_flows_from_host_verdict_to_guest_mirror() {
    let mut host = MatchSim::new(SessionRole::host(PlayerSide::Left), DT);
    let mut guest = MatchSim::new(SessionRole::guest(PlayerSide::Right), DT);
    let (mut h_out, mut g_out) = (Vec::new(), Vec::new());
    let (mut h_faults, mut g_faults) = (Vec::new(), Vec::new());

    // The host tosses and never swings; the ball falls past the table edge.
    host.handle_event(SessionEvent::ServeToss, &mut h_out);

    let mut ticks = 0;
    while h_faults.is_empty() && ticks < 240 {
        host.step(&mut h_out, &mut h_faults);
        guest.step(&mut g_out, &mut g_faults);
        pump(&mut h_out, &mut guest, &mut g_out);
        pump(&mut g_out, &mut host, &mut h_out);
        ticks += 1;
    }

    let report = h_faults.first().expect("host authored a verdict");
    assert_eq!(
        report.fault.reason,
        pingpong::domain::FaultReason::ServeDropped
    );
    assert_eq!(host.phase(), RallyPhase::PointEnded);
    assert!(host.ball().unwrap().frozen);

    // The guest never judged anything but mirrors the verdict once it lands.
    assert!(g_faults.is_empty());
    pump(&mut h_out, &mut guest, &mut g_out);
    assert_eq!(guest.phase(), RallyPhase::PointEnded);
    assert!(guest.ball().unwrap().frozen);
}

#[test]
fn reset_hands_the_serve_to_the_guest() {
    let mut host = MatchSim::new(SessionRole::host(PlayerSide::Left), DT);
    let mut guest = MatchSim::new(SessionRole::guest(PlayerSide::Right), DT);
    let (mut h_out, mut g_out) = (Vec::new(), Vec::new());

    host.handle_event(
        SessionEvent::Reset(pingpong::use_cases::ResetOrder {
            tick: 0,
            serving_player: PlayerSide::Right,
        }),
        &mut h_out,
    );
    pump(&mut h_out, &mut guest, &mut g_out);

    for sim in [&host, &guest] {
        assert_eq!(sim.phase(), RallyPhase::WaitingForServe);
        let ball = sim.ball().unwrap();
        assert!(ball.frozen);
        assert!(ball.pos.x > 0.0, "held on the guest's side");
    }

    // Now the guest owns the serve; its toss releases the ball on both peers.
    guest.handle_event(SessionEvent::ServeToss, &mut g_out);
    assert!(!guest.ball().unwrap().frozen);
    pump(&mut g_out, &mut host, &mut h_out);
    assert!(!host.ball().unwrap().frozen);
    assert!(host.ball().unwrap().vel.y > 0.0);
}

#[test]
fn guest_toss_keeps_the_peers_in_step() {
    let mut host = MatchSim::new(SessionRole::host(PlayerSide::Right), DT);
    let mut guest = MatchSim::new(SessionRole::guest(PlayerSide::Left), DT);
    let (mut h_out, mut g_out) = (Vec::new(), Vec::new());
    let (mut h_faults, mut g_faults) = (Vec::new(), Vec::new());

    // Host side is Right, so the host serves the first point.
    host.handle_event(SessionEvent::ServeToss, &mut h_out);
    pump(&mut h_out, &mut guest, &mut g_out);

    for _ in 0..20 {
        host.step(&mut h_out, &mut h_faults);
        guest.step(&mut g_out, &mut g_faults);
        pump(&mut h_out, &mut guest, &mut g_out);
        pump(&mut g_out, &mut host, &mut h_out);
    }

    let (hb, gb) = (host.ball().unwrap(), guest.ball().unwrap());
    assert!(
        hb.pos.distance(gb.pos) < 1e-3,
        "host {:?} vs guest {:?}",
        hb.pos,
        gb.pos
    );
}

#[test]
fn identical_inputs_give_identical_simulations() {
    let run = || {
        let mut sim = MatchSim::new(SessionRole::host(PlayerSide::Left), DT);
        let mut out = Vec::new();
        let mut faults = Vec::new();
        sim.handle_event(SessionEvent::ServeToss, &mut out);
        sim.handle_event(
            SessionEvent::PaddleInput {
                target: Vec3::new(-1.4, 0.95, 0.1),
                rot_z: 0.3,
            },
            &mut out,
        );
        for _ in 0..90 {
            sim.step(&mut out, &mut faults);
        }
        sim.ball().copied().unwrap()
    };
    assert_eq!(run(), run());
}

#[tokio::test]
async fn hello_handshake_assigns_the_opposite_side() {
    let session = build_session(SessionRole::host(PlayerSide::Left));
    let app = Router::new()
        .route("/ws", get(net::ws_handler))
        .with_state(session.state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let url = format!("ws://{addr}/ws");
    let (_stream, side) = net::connect(&url, Duration::from_secs(2))
        .await
        .expect("handshake");
    assert_eq!(side, PlayerSide::Right);

    session.shutdown.notify_waiters();
}

#[tokio::test]
async fn hosted_session_judges_a_dropped_serve_in_real_time() {
    let session = build_session(SessionRole::host(PlayerSide::Left));
    let mut frame_rx = session.frame_rx.clone();

    session
        .state
        .event_tx
        .send(SessionEvent::ServeToss)
        .await
        .expect("match loop alive");

    let verdict = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            frame_rx.changed().await.expect("frames keep coming");
            let phase = frame_rx.borrow().phase;
            if phase == RallyPhase::PointEnded {
                break;
            }
        }
    })
    .await;
    assert!(verdict.is_ok(), "dropped serve never judged");

    session.shutdown.notify_waiters();
}
