// Framework bootstrap for both peer roles.

use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::{Notify, broadcast, mpsc, watch};

use crate::frameworks::config;
use crate::interface_adapters::net::{self, outbound_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    MatchLoopDeps, RenderFrame, SessionEvent, SessionRole, match_task, score_task,
};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// A running match session: the shared adapter state plus the handles an
/// embedding renderer needs.
pub struct Session {
    pub state: Arc<AppState>,
    // Latest render frame; a renderer watches this at display rate.
    pub frame_rx: watch::Receiver<RenderFrame>,
    pub shutdown: Arc<Notify>,
}

/// Wire the channels and spawn the match tasks for `role`. The score keeper
/// runs on the host only; the guest hears about resets from the peer.
pub fn build_session(role: SessionRole) -> Session {
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(config::EVENT_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(config::OUTBOUND_CHANNEL_CAPACITY);
    let (outbound_bytes_tx, _outbound_bytes_rx) =
        broadcast::channel::<String>(config::OUTBOUND_BROADCAST_CAPACITY);
    let (fault_tx, fault_rx) = mpsc::channel(config::FAULT_CHANNEL_CAPACITY);
    let (frame_tx, frame_rx) = watch::channel(RenderFrame::default());
    let shutdown = Arc::new(Notify::new());

    tokio::spawn(match_task(MatchLoopDeps {
        role,
        event_rx,
        outbound_tx,
        fault_tx,
        frame_tx,
        tick_interval: config::TICK_INTERVAL,
        shutdown: shutdown.clone(),
    }));
    tokio::spawn(outbound_serializer(outbound_rx, outbound_bytes_tx.clone()));

    if role.is_host() {
        tokio::spawn(score_task(
            fault_rx,
            event_tx.clone(),
            config::RESET_DELAY,
            shutdown.clone(),
        ));
    }

    Session {
        state: Arc::new(AppState {
            event_tx,
            outbound_bytes_tx,
            role,
        }),
        frame_rx,
        shutdown,
    }
}

/// Run as the host: simulate, judge points, and serve the peer endpoint.
pub async fn run_host() -> Result<()> {
    init_runtime();

    let role = SessionRole::host(config::host_side());
    let session = build_session(role);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(session.state.clone());

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;
    tracing::info!(%address, side = ?role.side, "hosting match");

    let result = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    session.shutdown.notify_waiters();
    result
}

/// Run as the guest: connect to the host, take the assigned side, and bridge
/// the socket into the local simulation.
pub async fn run_guest() -> Result<()> {
    init_runtime();

    let url = config::peer_url();
    let (stream, side) = net::connect(&url, config::HELLO_TIMEOUT)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to join host: {e:?}")))?;

    let role = SessionRole::guest(side);
    let session = build_session(role);
    tracing::info!(side = ?side, "joined match as guest");

    // The host is already present from the guest's point of view.
    session
        .state
        .event_tx
        .send(SessionEvent::PeerJoined {
            side: role.remote_side(),
        })
        .await
        .map_err(|_| std::io::Error::other("match loop unavailable"))?;

    let result = net::run_bridge(
        stream,
        session.state.event_tx.clone(),
        session.state.outbound_bytes_tx.subscribe(),
        session.shutdown.clone(),
    )
    .await
    .map_err(|e| std::io::Error::other(format!("peer link failed: {e:?}")));
    session.shutdown.notify_waiters();
    result
}
