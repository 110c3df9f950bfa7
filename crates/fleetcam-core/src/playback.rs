// ── Clip playback URLs ──

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::CoreError;
use crate::model::Clip;

/// Lifetime requested for freshly signed URLs.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// A cached signed URL is reused only if it outlives `now` by this many seconds.
const REUSE_MARGIN_SECS: i64 = 300;

/// Signs short-lived download URLs for stored clip files.
pub trait ClipStorage: Send + Sync {
    fn create_signed_url(
        &self,
        storage_path: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// A URL the host can stream or download `clip` from.
///
/// Reuses the record's cached `signed_url` while it has more than five
/// minutes left, otherwise signs a new one valid for an hour.
pub async fn resolve_playback_url<S: ClipStorage>(
    clip: &Clip,
    storage: &S,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    if !clip.is_playable() {
        return Err(CoreError::validation(format!(
            "Clip {} is not ready for playback (status {})",
            clip.id, clip.status
        )));
    }

    if let (Some(url), Some(expires_at)) = (&clip.signed_url, clip.signed_url_expires_at) {
        if expires_at - now > TimeDelta::seconds(REUSE_MARGIN_SECS) {
            debug!(clip_id = %clip.id, "reusing cached signed URL");
            return Ok(url.clone());
        }
    }

    if clip.storage_path.is_empty() {
        return Err(CoreError::Storage {
            message: format!("Clip {} has no storage path", clip.id),
        });
    }

    debug!(clip_id = %clip.id, path = %clip.storage_path, "signing playback URL");
    storage
        .create_signed_url(&clip.storage_path, SIGNED_URL_TTL)
        .await
}
