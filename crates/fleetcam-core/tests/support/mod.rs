// In-memory collaborators for fleetcam-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;
use url::Url;

use fleetcam_core::{
    Camera, Clip, ClipChange, ClipFeed, ClipId, ClipRequestDraft, ClipStatus, CommandGateway,
    CoreError, FeedStatus, Player, PlayerFactory, Profile, RegionWire, StreamKey, StreamStatus,
};

// ── Gateway ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(StreamKey),
    Status(StreamKey),
    Stop(StreamKey),
    RingSummary(StreamKey),
    RequestClip { start_utc: i64, end_utc: i64 },
}

/// Scripted gateway. Unscripted start/stop calls succeed; unscripted
/// status queries report a feed that has not settled yet.
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<Call>>,
    start_replies: Mutex<VecDeque<Result<Option<String>, CoreError>>>,
    status_replies: Mutex<VecDeque<Result<StreamStatus, CoreError>>>,
    start_delay: Mutex<Duration>,
    status_delay: Mutex<Duration>,
    regions: Mutex<Vec<RegionWire>>,
    clip_rejection: Mutex<Option<String>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, Call::Stop(_)))
    }

    pub fn status_queries(&self) -> usize {
        self.count(|c| matches!(c, Call::Status(_)))
    }

    pub fn reply_start(&self, reply: Result<Option<String>, CoreError>) {
        self.start_replies.lock().unwrap().push_back(reply);
    }

    pub fn reply_status(&self, status: FeedStatus) {
        self.status_replies.lock().unwrap().push_back(Ok(StreamStatus {
            status,
            stream_url: None,
        }));
    }

    pub fn fail_status(&self, message: &str) {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(Err(CoreError::command(message)));
    }

    pub fn delay_start(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = delay;
    }

    pub fn delay_status(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn set_regions(&self, regions: &[(i64, i64)]) {
        *self.regions.lock().unwrap() = regions
            .iter()
            .map(|&(start_utc, end_utc)| RegionWire { start_utc, end_utc })
            .collect();
    }

    pub fn reject_clips(&self, message: &str) {
        *self.clip_rejection.lock().unwrap() = Some(message.to_owned());
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CommandGateway for FakeGateway {
    async fn start_stream(&self, key: &StreamKey, _period: u32) -> Result<Option<String>, CoreError> {
        self.record(Call::Start(key.clone()));
        let delay = *self.start_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.start_replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Some(format!(
                "/hls/{}/{}/{}/stream.m3u8",
                key.serial,
                key.camera.index(),
                key.profile.index()
            )))
        })
    }

    async fn stream_status(&self, key: &StreamKey) -> Result<StreamStatus, CoreError> {
        self.record(Call::Status(key.clone()));
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.status_replies.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(StreamStatus {
            status: FeedStatus::Unknown,
            stream_url: None,
        }))
    }

    async fn stop_stream(&self, key: &StreamKey) -> Result<(), CoreError> {
        self.record(Call::Stop(key.clone()));
        Ok(())
    }

    async fn ring_summary(&self, key: &StreamKey) -> Result<Vec<RegionWire>, CoreError> {
        self.record(Call::RingSummary(key.clone()));
        Ok(self.regions.lock().unwrap().clone())
    }

    async fn request_clip(&self, draft: &ClipRequestDraft) -> Result<(), CoreError> {
        self.record(Call::RequestClip {
            start_utc: draft.start_utc(),
            end_utc: draft.end_utc(),
        });
        let rejection = self.clip_rejection.lock().unwrap().clone();
        match rejection {
            Some(message) => Err(CoreError::Command {
                message,
                status: Some(200),
            }),
            None => Ok(()),
        }
    }
}

pub fn key() -> StreamKey {
    StreamKey::new("SN-100", Camera::Road, Profile::High)
}

// ── Players ─────────────────────────────────────────────────────────

/// Counts player creation and disposal; optionally fails to create.
#[derive(Clone, Default)]
pub struct CountingPlayers {
    pub created: Arc<AtomicUsize>,
    pub disposed: Arc<AtomicUsize>,
    pub endpoints: Arc<Mutex<Vec<Url>>>,
    pub fail: bool,
}

impl CountingPlayers {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

pub struct CountingPlayer {
    disposed: Arc<AtomicUsize>,
}

impl Player for CountingPlayer {
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

impl PlayerFactory for CountingPlayers {
    type Player = CountingPlayer;

    fn create(&self, endpoint: &Url) -> Result<CountingPlayer, CoreError> {
        if self.fail {
            return Err(CoreError::Internal("no video output".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoint.clone());
        Ok(CountingPlayer {
            disposed: Arc::clone(&self.disposed),
        })
    }
}

// ── Clip feed ───────────────────────────────────────────────────────

/// Point query backed by a vector; change feed backed by an mpsc channel.
pub struct FakeFeed {
    stored: Mutex<Vec<Clip>>,
    changes: Mutex<Option<mpsc::UnboundedReceiver<ClipChange>>>,
    fetches: AtomicUsize,
}

impl FakeFeed {
    pub fn new(stored: Vec<Clip>) -> (Arc<Self>, mpsc::UnboundedSender<ClipChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = Arc::new(Self {
            stored: Mutex::new(stored),
            changes: Mutex::new(Some(rx)),
            fetches: AtomicUsize::new(0),
        });
        (feed, tx)
    }

    pub fn store(&self, clips: Vec<Clip>) {
        *self.stored.lock().unwrap() = clips;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ClipFeed for FakeFeed {
    async fn fetch_clips(&self, _serial: &str) -> Result<Vec<Clip>, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn subscribe(&self, _serial: &str) -> Result<BoxStream<'static, ClipChange>, CoreError> {
        let mut rx = self
            .changes
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| CoreError::Storage {
                message: "already subscribed".into(),
            })?;
        Ok(async_stream::stream! {
            while let Some(change) = rx.recv().await {
                yield change;
            }
        }
        .boxed())
    }
}

pub fn clip(id: i64, status: ClipStatus) -> Clip {
    Clip {
        id: ClipId(id),
        serial: "SN-100".into(),
        camera: Camera::Road,
        profile: Profile::High,
        start_utc: 1_700_000_000,
        end_utc: 1_700_000_060,
        duration_seconds: 60,
        file_size: 4_000_000,
        storage_path: format!("SN-100/{id}.mp4"),
        status,
        progress_percent: 0,
        bytes_received: 0,
        error_message: None,
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_100 + id, 0).unwrap(),
        signed_url: None,
        signed_url_expires_at: None,
    }
}
