//! Shared helpers for command handlers.

use chrono::DateTime;

use fleetcam_core::StreamKey;

use crate::cli::FeedArgs;

impl FeedArgs {
    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.serial.clone(), self.camera, self.quality)
    }
}

/// `2024-05-01 12:00:00` for a unix timestamp, or the raw number if it is
/// out of range.
pub fn format_utc(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0).map_or_else(
        || secs.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// `4m 05s` style duration.
pub fn format_duration(secs: i64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
