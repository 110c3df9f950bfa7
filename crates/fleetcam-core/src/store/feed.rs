// ── Storage service seams ──

use std::future::Future;

use futures_util::stream::BoxStream;

use crate::error::CoreError;
use crate::model::{Clip, ClipChange};

/// The storage/query service's view of clip records for one device.
pub trait ClipFeed: Send + Sync + 'static {
    /// Point query: every clip currently stored for `serial`.
    fn fetch_clips(
        &self,
        serial: &str,
    ) -> impl Future<Output = Result<Vec<Clip>, CoreError>> + Send;

    /// Realtime changes scoped to `serial`. Delivery is at-least-once and
    /// unordered across reconnects; the stream ends when the feed closes.
    fn subscribe(
        &self,
        serial: &str,
    ) -> impl Future<Output = Result<BoxStream<'static, ClipChange>, CoreError>> + Send;
}
