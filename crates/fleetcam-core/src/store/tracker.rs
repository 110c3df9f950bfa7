// ── Clip ingestion tracker ──
//
// Keeps a ClipProjection in step with the storage service: subscribe to
// the change feed first, seed from the point query, then apply events in
// a background task. Subscribers get ordered snapshots through a watch
// channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::feed::ClipFeed;
use super::projection::ClipProjection;
use crate::error::CoreError;
use crate::model::{Clip, ClipChange};
use crate::stream::ClipStream;

type Snapshot = Arc<Vec<Arc<Clip>>>;

/// Live projection of one device's clips.
///
/// Dropping the tracker detaches it from the feed.
pub struct ClipTracker<F: ClipFeed> {
    feed: Arc<F>,
    shared: Arc<TrackerShared>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

struct TrackerShared {
    projection: Mutex<ClipProjection>,
    snapshots: watch::Sender<Snapshot>,
}

impl TrackerShared {
    fn lock(&self) -> MutexGuard<'_, ClipProjection> {
        self.projection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, change: ClipChange) -> bool {
        let mut projection = self.lock();
        let clip_id = change.id();
        let changed = projection.apply(change);
        if changed {
            debug!(serial = projection.serial(), %clip_id, "clip projection updated");
            self.snapshots.send_replace(projection.snapshot());
        }
        changed
    }

    fn seed(&self, clips: Vec<Clip>) {
        let mut projection = self.lock();
        projection.seed(clips);
        self.snapshots.send_replace(projection.snapshot());
    }
}

impl<F: ClipFeed> ClipTracker<F> {
    /// Subscribe to `serial`'s change feed, seed, and start applying events.
    pub async fn attach(feed: Arc<F>, serial: impl Into<String>) -> Result<Self, CoreError> {
        let serial = serial.into();
        let changes = feed.subscribe(&serial).await?;
        let clips = feed.fetch_clips(&serial).await?;

        let mut projection = ClipProjection::new(serial.clone());
        projection.seed(clips);
        let (snapshots, _) = watch::channel(projection.snapshot());
        info!(%serial, clips = projection.len(), "clip tracker attached");

        let shared = Arc::new(TrackerShared {
            projection: Mutex::new(projection),
            snapshots,
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(apply_changes(
            Arc::clone(&shared),
            changes,
            cancel.clone(),
            serial,
        ));

        Ok(Self {
            feed,
            shared,
            cancel,
            task: Some(task),
        })
    }

    pub fn serial(&self) -> String {
        self.shared.lock().serial().to_owned()
    }

    /// Current ordered projection, newest first.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> ClipStream {
        ClipStream::new(self.shared.snapshots.subscribe())
    }

    /// Replace the projection with a fresh point query, e.g. after the
    /// host suspects it missed events.
    pub async fn reseed(&self) -> Result<(), CoreError> {
        let serial = self.serial();
        let clips = self.feed.fetch_clips(&serial).await?;
        debug!(%serial, clips = clips.len(), "reseeding clip projection");
        self.shared.seed(clips);
        Ok(())
    }

    /// Apply a change delivered out of band. Returns `true` if the view
    /// changed.
    pub fn apply(&self, change: ClipChange) -> bool {
        self.shared.apply(change)
    }

    /// The change feed is still being consumed.
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop consuming the change feed. The last snapshot stays readable.
    pub fn detach(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<F: ClipFeed> Drop for ClipTracker<F> {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn apply_changes(
    shared: Arc<TrackerShared>,
    mut changes: futures_util::stream::BoxStream<'static, ClipChange>,
    cancel: CancellationToken,
    serial: String,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            next = changes.next() => {
                if let Some(change) = next {
                    shared.apply(change);
                } else {
                    warn!(%serial, "clip change feed closed");
                    break;
                }
            }
        }
    }
}
