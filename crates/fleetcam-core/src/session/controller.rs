// ── Stream session controller ──
//
// Drives one live-stream session through Stopped -> Starting -> Active,
// with Error as the terminal failure state. Every exit route (stop,
// dispose, drop) goes through `teardown`, which cancels polling,
// invalidates in-flight results, releases the player and the registry
// claim, and reports `Stopped`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fleetcam_api::types::FeedStatus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::player::{NoPlayback, Player, PlayerFactory};
use super::registry::{OwnerId, SessionRegistry};
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::gateway::{CommandGateway, StreamStatus};
use crate::model::{StreamKey, StreamSession, StreamState};

const START_FAILED: &str = "Stream failed to start";
const STATUS_FAILED: &str = "Failed to check stream status";
const DEVICE_STOPPED: &str = "Stream failed to start: device reported the stream stopped";

/// Owns exactly one live-stream session.
///
/// Not `Clone`: the session has a single owner. Dropping the controller
/// disposes it.
pub struct StreamController<G: CommandGateway, P: PlayerFactory = NoPlayback> {
    inner: Arc<ControllerInner<G, P>>,
}

struct ControllerInner<G: CommandGateway, P: PlayerFactory> {
    gateway: Arc<G>,
    players: P,
    config: SessionConfig,
    registry: SessionRegistry,
    owner: OwnerId,
    session: watch::Sender<StreamSession>,
    run: Mutex<RunState<P::Player>>,
}

/// Mutable bookkeeping, guarded together with every session transition.
struct RunState<Pl> {
    /// Bumped on every start and teardown; results from an older
    /// generation are discarded.
    generation: u64,
    /// Key currently claimed in the registry.
    claimed: Option<StreamKey>,
    cancel: CancellationToken,
    poll: Option<JoinHandle<()>>,
    player: Option<Pl>,
}

enum StartOutcome {
    Applied,
    Failed(CoreError),
    /// A stop/dispose ran while the start command was in flight.
    Superseded { orphaned: bool },
}

impl<G: CommandGateway> StreamController<G, NoPlayback> {
    /// Headless controller: sessions reach `Active` without a player.
    pub fn new(gateway: Arc<G>, config: SessionConfig, registry: SessionRegistry) -> Self {
        Self::with_players(gateway, NoPlayback, config, registry)
    }
}

impl<G: CommandGateway, P: PlayerFactory> StreamController<G, P> {
    pub fn with_players(
        gateway: Arc<G>,
        players: P,
        config: SessionConfig,
        registry: SessionRegistry,
    ) -> Self {
        let (session, _) = watch::channel(StreamSession::default());
        let owner = registry.next_owner();
        Self {
            inner: Arc::new(ControllerInner {
                gateway,
                players,
                config,
                registry,
                owner,
                session,
                run: Mutex::new(RunState {
                    generation: 0,
                    claimed: None,
                    cancel: CancellationToken::new(),
                    poll: None,
                    player: None,
                }),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn current_state(&self) -> StreamSession {
        self.inner.session.borrow().clone()
    }

    /// Receive every session transition.
    pub fn subscribe(&self) -> watch::Receiver<StreamSession> {
        self.inner.session.subscribe()
    }

    /// Wait until the session is no longer `Starting`.
    pub async fn wait_settled(&self) -> StreamSession {
        let mut rx = self.inner.session.subscribe();
        match rx.wait_for(|s| s.state != StreamState::Starting).await {
            Ok(session) => session.clone(),
            Err(_) => self.current_state(),
        }
    }

    /// A status poll task is scheduled or running.
    pub fn is_polling(&self) -> bool {
        self.inner
            .lock()
            .poll
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn has_player(&self) -> bool {
        self.inner.lock().player.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Ask the device for a live feed and begin polling for it.
    ///
    /// Allowed from `Stopped` or `Error`. A start command failure moves the
    /// session to `Error` and is returned; no retry is attempted.
    pub async fn start(&self, key: StreamKey) -> Result<(), CoreError> {
        let generation = self.inner.begin_start(&key)?;

        info!(
            serial = %key.serial,
            camera = key.camera.index(),
            profile = key.profile.index(),
            "starting live stream"
        );
        let result = self
            .inner
            .gateway
            .start_stream(&key, self.inner.config.stream_period)
            .await;

        match ControllerInner::finish_start(&self.inner, &key, generation, result) {
            StartOutcome::Applied => Ok(()),
            StartOutcome::Failed(err) => Err(err),
            StartOutcome::Superseded { orphaned } => {
                if orphaned {
                    debug!(serial = %key.serial, "start answered after stop, stopping remote feed");
                    if let Err(e) = self.inner.gateway.stop_stream(&key).await {
                        warn!(serial = %key.serial, error = %e, "best-effort stop failed");
                    }
                }
                Err(CoreError::Cancelled {
                    reason: "stream was stopped before the device answered".into(),
                })
            }
        }
    }

    /// Tear the session down and stop the remote feed.
    ///
    /// Local state is `Stopped` when this returns, even if the stop
    /// command fails. Calling it on a stopped session does nothing.
    pub async fn stop(&self) -> Result<(), CoreError> {
        let Some(key) = self.inner.teardown() else {
            return Ok(());
        };
        info!(serial = %key.serial, camera = key.camera.index(), "stopping live stream");
        self.inner
            .gateway
            .stop_stream(&key)
            .await
            .inspect_err(|e| warn!(serial = %key.serial, error = %e, "stop command failed"))
    }

    /// Synchronous teardown for host shutdown.
    ///
    /// The remote stop is spawned on the current runtime without waiting;
    /// failures are logged and never surfaced.
    pub fn dispose(&self) {
        let Some(key) = self.inner.teardown() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let gateway = Arc::clone(&self.inner.gateway);
                handle.spawn(async move {
                    if let Err(e) = gateway.stop_stream(&key).await {
                        warn!(serial = %key.serial, error = %e, "stop on dispose failed");
                    }
                });
            }
            Err(_) => {
                warn!(serial = %key.serial, "no async runtime, remote stop on dispose skipped");
            }
        }
    }
}

impl<G: CommandGateway, P: PlayerFactory> Drop for StreamController<G, P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ── Internals ────────────────────────────────────────────────────────

impl<G: CommandGateway, P: PlayerFactory> ControllerInner<G, P> {
    fn lock(&self) -> MutexGuard<'_, RunState<P::Player>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> StreamState {
        self.session.borrow().state
    }

    /// Validate, claim the key, and enter `Starting`.
    fn begin_start(&self, key: &StreamKey) -> Result<u64, CoreError> {
        let mut run = self.lock();
        if self.state().is_live() {
            return Err(CoreError::SessionBusy {
                key: self
                    .session
                    .borrow()
                    .key
                    .as_ref()
                    .unwrap_or(key)
                    .to_string(),
            });
        }

        self.registry.claim(key, self.owner)?;
        if let Some(previous) = run.claimed.replace(key.clone()) {
            if &previous != key {
                self.registry.release(&previous, self.owner);
            }
        }

        run.generation += 1;
        run.cancel = CancellationToken::new();
        self.session.send_replace(StreamSession {
            key: Some(key.clone()),
            state: StreamState::Starting,
            endpoint: None,
            last_error: None,
        });
        Ok(run.generation)
    }

    /// Apply the start command's result, unless a teardown got there first.
    fn finish_start(
        this: &Arc<Self>,
        key: &StreamKey,
        generation: u64,
        result: Result<Option<String>, CoreError>,
    ) -> StartOutcome {
        let mut run = this.lock();
        if run.generation != generation {
            // Only clean up after ourselves if nobody restarted the same feed.
            let restarted = run.claimed.as_ref() == Some(key) && this.state().is_live();
            return StartOutcome::Superseded {
                orphaned: result.is_ok() && !restarted,
            };
        }

        match result {
            Err(err) => {
                warn!(serial = %key.serial, error = %err, "start command failed");
                this.session.send_modify(|s| {
                    s.state = StreamState::Error;
                    s.last_error = Some(err.to_string());
                });
                StartOutcome::Failed(err)
            }
            Ok(stream_url) => {
                let endpoint =
                    resolve_endpoint(this.config.hls_base_url.as_ref(), stream_url.as_deref(), key);
                this.session.send_modify(|s| s.endpoint = endpoint);
                run.poll = Some(tokio::spawn(poll_until_settled(
                    Arc::clone(this),
                    key.clone(),
                    generation,
                    run.cancel.clone(),
                )));
                StartOutcome::Applied
            }
        }
    }

    /// Apply one status reply. Returns `true` when polling should stop.
    fn apply_status(&self, key: &StreamKey, generation: u64, reply: StreamStatus) -> bool {
        let mut run = self.lock();
        if run.generation != generation || self.state() != StreamState::Starting {
            return true;
        }

        if let Some(url) = reply.stream_url.as_deref() {
            if let Some(endpoint) = resolve_endpoint(self.config.hls_base_url.as_ref(), Some(url), key) {
                self.session.send_modify(|s| s.endpoint = Some(endpoint));
            }
        }

        match reply.status {
            FeedStatus::Active => {
                let endpoint = self.session.borrow().endpoint.clone();
                let player = match endpoint {
                    Some(url) => self.players.create(&url),
                    None => Err(CoreError::Internal("no stream endpoint".into())),
                };
                let player_error = match player {
                    Ok(player) => {
                        run.player = Some(player);
                        None
                    }
                    Err(e) => {
                        warn!(serial = %key.serial, error = %e, "player creation failed");
                        Some(format!("Failed to initialize video player: {e}"))
                    }
                };
                run.poll = None;
                self.session.send_modify(|s| {
                    s.state = StreamState::Active;
                    s.last_error = player_error;
                });
                info!(serial = %key.serial, "live stream active");
                true
            }
            FeedStatus::Stopped => {
                run.poll = None;
                self.session.send_modify(|s| {
                    s.state = StreamState::Error;
                    s.last_error = Some(DEVICE_STOPPED.into());
                });
                warn!(serial = %key.serial, "device reported the stream stopped while starting");
                true
            }
            FeedStatus::Unknown => false,
        }
    }

    /// Attempt budget spent without a settled status.
    fn fail_exhausted(&self, key: &StreamKey, generation: u64, last_query_failed: bool) {
        let mut run = self.lock();
        if run.generation != generation || self.state() != StreamState::Starting {
            return;
        }
        run.poll = None;
        let message = if last_query_failed {
            STATUS_FAILED
        } else {
            START_FAILED
        };
        self.session.send_modify(|s| {
            s.state = StreamState::Error;
            s.last_error = Some(message.into());
        });
        warn!(serial = %key.serial, attempts = self.config.max_poll_attempts, "{message}");
    }

    /// The single cleanup path. Returns the key when a remote stop is owed.
    fn teardown(&self) -> Option<StreamKey> {
        let mut run = self.lock();

        run.cancel.cancel();
        if let Some(handle) = run.poll.take() {
            handle.abort();
        }
        run.generation += 1;

        // The player goes before anyone can observe `Stopped`.
        if let Some(mut player) = run.player.take() {
            player.dispose();
        }

        let claimed = run.claimed.take();
        if let Some(key) = &claimed {
            self.registry.release(key, self.owner);
        }

        if self.state() != StreamState::Stopped {
            self.session.send_modify(|s| {
                s.state = StreamState::Stopped;
                s.endpoint = None;
                s.last_error = None;
            });
        }
        claimed
    }
}

/// Bounded status polling: one query per `poll_interval` tick, up to the
/// attempt budget. Ticks are scheduled from the start, so a slow reply
/// does not push later queries back by its own latency.
async fn poll_until_settled<G: CommandGateway, P: PlayerFactory>(
    inner: Arc<ControllerInner<G, P>>,
    key: StreamKey,
    generation: u64,
    cancel: CancellationToken,
) {
    // `interval` rejects a zero period.
    let period = inner.config.poll_interval.max(Duration::from_millis(1));
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_query_failed = false;

    for attempt in 1..=inner.config.max_poll_attempts {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticks.tick() => {}
        }

        let reply = tokio::select! {
            () = cancel.cancelled() => return,
            reply = inner.gateway.stream_status(&key) => reply,
        };

        match reply {
            Ok(reply) => {
                debug!(serial = %key.serial, attempt, status = ?reply.status, "stream status");
                last_query_failed = false;
                if inner.apply_status(&key, generation, reply) {
                    return;
                }
            }
            Err(e) => {
                debug!(serial = %key.serial, attempt, error = %e, "status query failed");
                last_query_failed = true;
            }
        }
    }

    inner.fail_exhausted(&key, generation, last_query_failed);
}

/// Turn the gateway's `stream_url` into a playable URL.
///
/// Absolute URLs are used as-is, relative ones are joined onto `base`.
/// Without a `stream_url` the gateway's conventional HLS path is assumed.
fn resolve_endpoint(base: Option<&Url>, stream_url: Option<&str>, key: &StreamKey) -> Option<Url> {
    let Some(stream_url) = stream_url else {
        let mut url = base?.join("/").ok()?;
        url.path_segments_mut()
            .ok()?
            .clear()
            .push("hls")
            .push(&key.serial)
            .push(&key.camera.index().to_string())
            .push(&key.profile.index().to_string())
            .push("stream.m3u8");
        return Some(url);
    };

    match Url::parse(stream_url) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(stream_url).ok(),
        Err(e) => {
            warn!(stream_url, error = %e, "gateway returned an unusable stream URL");
            None
        }
    }
}
