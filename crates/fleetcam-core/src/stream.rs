// ── Reactive clip snapshots ──
//
// Subscription type for consuming projection changes from a ClipTracker.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Clip;

type Snapshot = Arc<Vec<Arc<Clip>>>;

/// A subscription to a tracker's clip projection.
///
/// Offers the snapshot at subscription time, the latest one, and change
/// notification via `changed()` or as a `Stream`.
pub struct ClipStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl ClipStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the tracker is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Yields the current snapshot first, then one per change.
    pub fn into_stream(self) -> ClipWatchStream {
        ClipWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the tracker's watch channel.
pub struct ClipWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for ClipWatchStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
