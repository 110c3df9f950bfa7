#![allow(clippy::unwrap_used)]
// Stream session lifecycle against a scripted gateway, with paused time.

mod support;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use url::Url;

use fleetcam_core::{
    CoreError, FeedStatus, SessionConfig, SessionRegistry, StreamController, StreamKey,
    StreamState,
};
use support::{Call, CountingPlayers, FakeGateway, key};

fn config() -> SessionConfig {
    SessionConfig {
        hls_base_url: Some(Url::parse("https://gw.example.com").unwrap()),
        ..SessionConfig::default()
    }
}

fn controller(
    gateway: &Arc<FakeGateway>,
    players: &CountingPlayers,
) -> StreamController<FakeGateway, CountingPlayers> {
    StreamController::with_players(
        Arc::clone(gateway),
        players.clone(),
        config(),
        SessionRegistry::new(),
    )
}

// ── Starting ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn start_polls_until_active_then_opens_player() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Unknown);
    gateway.reply_status(FeedStatus::Active);
    let players = CountingPlayers::default();
    let ctrl = controller(&gateway, &players);

    ctrl.start(key()).await.unwrap();
    assert_eq!(ctrl.current_state().state, StreamState::Starting);

    let session = ctrl.wait_settled().await;
    assert_eq!(session.state, StreamState::Active);
    assert_eq!(session.last_error, None);
    assert_eq!(
        session.endpoint.unwrap().as_str(),
        "https://gw.example.com/hls/SN-100/0/0/stream.m3u8"
    );
    assert_eq!(gateway.status_queries(), 2);
    assert!(!ctrl.is_polling());
    assert!(ctrl.has_player());
    assert_eq!(players.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn unsettled_polls_exhaust_the_budget() {
    let gateway = FakeGateway::new();
    let players = CountingPlayers::default();
    let ctrl = controller(&gateway, &players);

    let started = tokio::time::Instant::now();
    ctrl.start(key()).await.unwrap();
    let session = ctrl.wait_settled().await;

    assert_eq!(session.state, StreamState::Error);
    assert_eq!(session.last_error.as_deref(), Some("Stream failed to start"));
    assert_eq!(gateway.status_queries(), 10);
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert!(!ctrl.is_polling());
    assert!(!ctrl.has_player());
}

#[tokio::test(start_paused = true)]
async fn slow_replies_do_not_stretch_the_poll_period() {
    let gateway = FakeGateway::new();
    gateway.delay_status(Duration::from_secs(1));
    let ctrl = controller(&gateway, &CountingPlayers::default());

    let started = tokio::time::Instant::now();
    ctrl.start(key()).await.unwrap();

    // Queries go out at t=2s and t=4s even though each takes 1s to answer.
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(gateway.status_queries(), 2);

    let session = ctrl.wait_settled().await;
    assert_eq!(session.state, StreamState::Error);
    assert_eq!(gateway.status_queries(), 10);
    assert!(started.elapsed() < Duration::from_secs(25));
}

#[tokio::test(start_paused = true)]
async fn stopped_reply_fails_the_start() {
    let gateway = FakeGateway::new();
    for _ in 0..10 {
        gateway.reply_status(FeedStatus::Stopped);
    }
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    let session = ctrl.wait_settled().await;

    assert_eq!(session.state, StreamState::Error);
    assert!(
        session
            .last_error
            .as_deref()
            .unwrap()
            .contains("failed to start")
    );
    assert_eq!(gateway.status_queries(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(gateway.status_queries(), 1);
    assert!(!ctrl.is_polling());
}

#[tokio::test(start_paused = true)]
async fn failing_final_query_reports_status_check_failure() {
    let gateway = FakeGateway::new();
    for _ in 0..9 {
        gateway.reply_status(FeedStatus::Unknown);
    }
    gateway.fail_status("connection reset");
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    let session = ctrl.wait_settled().await;

    assert_eq!(
        session.last_error.as_deref(),
        Some("Failed to check stream status")
    );
}

#[tokio::test(start_paused = true)]
async fn transient_query_failures_are_tolerated() {
    let gateway = FakeGateway::new();
    gateway.fail_status("connection reset");
    gateway.fail_status("connection reset");
    gateway.reply_status(FeedStatus::Active);
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    assert_eq!(ctrl.wait_settled().await.state, StreamState::Active);
}

#[tokio::test(start_paused = true)]
async fn start_command_failure_is_terminal() {
    let gateway = FakeGateway::new();
    gateway.reply_start(Err(CoreError::command("unit offline")));
    let ctrl = controller(&gateway, &CountingPlayers::default());

    let err = ctrl.start(key()).await.unwrap_err();
    assert_eq!(err.to_string(), "unit offline");

    let session = ctrl.current_state();
    assert_eq!(session.state, StreamState::Error);
    assert_eq!(session.last_error.as_deref(), Some("unit offline"));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(gateway.status_queries(), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_from_error_clears_last_error() {
    let gateway = FakeGateway::new();
    gateway.reply_start(Err(CoreError::command("unit offline")));
    gateway.reply_status(FeedStatus::Active);
    let ctrl = controller(&gateway, &CountingPlayers::default());

    assert!(ctrl.start(key()).await.is_err());
    ctrl.start(key()).await.unwrap();
    assert_eq!(ctrl.current_state().last_error, None);
    assert_eq!(ctrl.wait_settled().await.state, StreamState::Active);
}

#[tokio::test(start_paused = true)]
async fn player_failure_keeps_the_stream_active() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Active);
    let players = CountingPlayers {
        fail: true,
        ..CountingPlayers::default()
    };
    let ctrl = controller(&gateway, &players);

    ctrl.start(key()).await.unwrap();
    let session = ctrl.wait_settled().await;

    assert_eq!(session.state, StreamState::Active);
    assert!(
        session
            .last_error
            .unwrap()
            .starts_with("Failed to initialize video player:")
    );
    assert!(!ctrl.has_player());
}

// ── Ownership ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn start_while_live_is_refused_without_a_request() {
    let gateway = FakeGateway::new();
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    let err = ctrl.start(key()).await.unwrap_err();

    assert!(matches!(err, CoreError::SessionBusy { .. }));
    assert_eq!(gateway.count(|c| matches!(c, Call::Start(_))), 1);
}

#[tokio::test(start_paused = true)]
async fn registry_keeps_one_owner_per_feed() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Active);
    let registry = SessionRegistry::new();
    let first = StreamController::new(Arc::clone(&gateway), config(), registry.clone());
    let second = StreamController::new(Arc::clone(&gateway), config(), registry.clone());

    first.start(key()).await.unwrap();
    let err = second.start(key()).await.unwrap_err();
    assert!(matches!(err, CoreError::SessionBusy { .. }));
    assert_eq!(second.current_state().state, StreamState::Stopped);

    // A different camera is a different feed.
    let other = StreamKey::new("SN-100", fleetcam_core::Camera::Driver, key().profile);
    second.start(other).await.unwrap();
    second.stop().await.unwrap();

    first.stop().await.unwrap();
    assert!(registry.is_empty());
    second.start(key()).await.unwrap();
    assert!(registry.is_claimed(&key()));
}

// ── Stopping ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stop_and_dispose_are_idempotent() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Active);
    let players = CountingPlayers::default();
    let ctrl = controller(&gateway, &players);

    ctrl.start(key()).await.unwrap();
    ctrl.wait_settled().await;

    ctrl.stop().await.unwrap();
    ctrl.stop().await.unwrap();
    ctrl.dispose();
    ctrl.dispose();

    let session = ctrl.current_state();
    assert_eq!(session.state, StreamState::Stopped);
    assert_eq!(session.endpoint, None);
    assert!(!ctrl.is_polling());
    assert!(!ctrl.has_player());
    assert_eq!(players.created(), 1);
    assert_eq!(players.disposed(), 1);
    assert_eq!(gateway.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_on_a_fresh_controller_sends_nothing() {
    let gateway = FakeGateway::new();
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.stop().await.unwrap();
    ctrl.dispose();

    assert!(gateway.calls().is_empty());
    assert_eq!(ctrl.current_state().state, StreamState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_from_error_still_stops_the_remote_feed() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Stopped);
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    assert_eq!(ctrl.wait_settled().await.state, StreamState::Error);

    ctrl.stop().await.unwrap();
    let session = ctrl.current_state();
    assert_eq!(session.state, StreamState::Stopped);
    assert_eq!(session.last_error, None);
    assert_eq!(gateway.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_while_starting_cancels_polling() {
    let gateway = FakeGateway::new();
    let ctrl = controller(&gateway, &CountingPlayers::default());

    ctrl.start(key()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    let polled = gateway.status_queries();
    assert!(ctrl.is_polling());

    ctrl.stop().await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(gateway.status_queries(), polled);
    assert!(!ctrl.is_polling());
    assert_eq!(ctrl.current_state().state, StreamState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn late_active_reply_does_not_revive_a_stopped_session() {
    let gateway = FakeGateway::new();
    gateway.delay_status(Duration::from_secs(5));
    gateway.reply_status(FeedStatus::Active);
    let players = CountingPlayers::default();
    let ctrl = controller(&gateway, &players);

    ctrl.start(key()).await.unwrap();
    // First query goes out at t=2s and answers at t=7s.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(gateway.status_queries(), 1);

    ctrl.stop().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(ctrl.current_state().state, StreamState::Stopped);
    assert_eq!(players.created(), 0);
    assert!(!ctrl.has_player());
}

#[tokio::test(start_paused = true)]
async fn start_answered_after_stop_is_discarded() {
    let gateway = FakeGateway::new();
    gateway.delay_start(Duration::from_secs(1));
    let ctrl = Arc::new(controller(&gateway, &CountingPlayers::default()));

    let pending = tokio::spawn({
        let ctrl = Arc::clone(&ctrl);
        async move { ctrl.start(key()).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctrl.stop().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::Cancelled { .. }));
    assert_eq!(ctrl.current_state().state, StreamState::Stopped);
    assert!(!ctrl.is_polling());

    // The stop that raced ahead, then one more once the device answered.
    assert_eq!(gateway.stops(), 2);
    assert_eq!(gateway.status_queries(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_stops_the_feed_in_the_background() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Active);
    let players = CountingPlayers::default();
    let ctrl = controller(&gateway, &players);

    ctrl.start(key()).await.unwrap();
    ctrl.wait_settled().await;
    drop(ctrl);

    assert_eq!(players.disposed(), 1);
    tokio::task::yield_now().await;
    assert_eq!(gateway.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_transition() {
    let gateway = FakeGateway::new();
    gateway.reply_status(FeedStatus::Active);
    let ctrl = controller(&gateway, &CountingPlayers::default());
    let mut rx = ctrl.subscribe();

    ctrl.start(key()).await.unwrap();
    rx.wait_for(|s| s.state == StreamState::Active).await.unwrap();
    ctrl.stop().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().state, StreamState::Stopped);
    assert_eq!(rx.borrow().key.as_ref(), Some(&key()));
}
