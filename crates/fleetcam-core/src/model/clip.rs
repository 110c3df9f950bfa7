// ── Clip records and change-feed events ──
//
// `Clip` mirrors the storage service's row. The tracker never derives
// status or progress itself; whatever the feed pushes is taken as-is.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::{Camera, Profile};

/// Storage-assigned clip identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub i64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transfer lifecycle of a clip, as reported by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClipStatus {
    Receiving,
    Ready,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub serial: String,
    pub camera: Camera,
    pub profile: Profile,
    pub start_utc: i64,
    pub end_utc: i64,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub storage_path: String,
    pub status: ClipStatus,
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default)]
    pub bytes_received: u64,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub signed_url_expires_at: Option<DateTime<Utc>>,
}

impl Clip {
    /// The file has landed in storage and can be streamed or downloaded.
    pub fn is_playable(&self) -> bool {
        matches!(self.status, ClipStatus::Ready | ClipStatus::Completed)
    }

    /// `{serial}_{road|cab}_{YYYY-MM-DDTHH-MM-SS}.mp4`, timed from `start_utc`.
    pub fn download_filename(&self) -> String {
        let stamp = DateTime::<Utc>::from_timestamp(self.start_utc, 0).map_or_else(
            || self.start_utc.to_string(),
            |t| t.format("%Y-%m-%dT%H-%M-%S").to_string(),
        );
        format!(
            "{}_{}_{stamp}.mp4",
            self.serial,
            self.camera.short_name().to_lowercase()
        )
    }
}

/// Key carried by delete events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipKey {
    pub id: ClipId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

/// One realtime change-feed event.
///
/// Delivery is at-least-once with no ordering guarantee across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "UPPERCASE")]
pub enum ClipChange {
    Insert { new: Clip },
    Update { new: Clip },
    Delete { old: ClipKey },
}

impl ClipChange {
    pub fn id(&self) -> ClipId {
        match self {
            Self::Insert { new } | Self::Update { new } => new.id,
            Self::Delete { old } => old.id,
        }
    }

    /// Serial the event belongs to, when the payload says.
    pub fn serial(&self) -> Option<&str> {
        match self {
            Self::Insert { new } | Self::Update { new } => Some(&new.serial),
            Self::Delete { old } => old.serial.as_deref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn clip(id: i64, status: ClipStatus) -> Clip {
        Clip {
            id: ClipId(id),
            serial: "SN1".into(),
            camera: Camera::Road,
            profile: Profile::High,
            start_utc: 1_700_000_000,
            end_utc: 1_700_000_060,
            duration_seconds: 60,
            file_size: 0,
            storage_path: format!("SN1/{id}.mp4"),
            status,
            progress_percent: 0,
            bytes_received: 0,
            error_message: None,
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_100 + id, 0).unwrap(),
            signed_url: None,
            signed_url_expires_at: None,
        }
    }

    #[test]
    fn change_feed_payload_parses() {
        let change: ClipChange = serde_json::from_value(json!({
            "eventType": "UPDATE",
            "new": {
                "id": 5, "serial": "SN1", "camera": 1, "profile": 0,
                "start_utc": 100, "end_utc": 160, "duration_seconds": 60,
                "file_size": 1024, "storage_path": "SN1/5.mp4",
                "status": "ready", "progress_percent": 100, "bytes_received": 1024,
                "error_message": null, "created_at": "2025-01-01T00:00:00Z",
                "signed_url": null, "signed_url_expires_at": null
            }
        }))
        .unwrap();

        assert_eq!(change.id(), ClipId(5));
        match change {
            ClipChange::Update { new } => {
                assert_eq!(new.camera, Camera::Driver);
                assert_eq!(new.status, ClipStatus::Ready);
                assert!(new.is_playable());
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn delete_carries_only_the_key() {
        let change: ClipChange =
            serde_json::from_value(json!({ "eventType": "DELETE", "old": { "id": 9 } })).unwrap();
        assert_eq!(change.id(), ClipId(9));
        assert_eq!(change.serial(), None);
    }

    #[test]
    fn unrecognised_status_is_kept_as_unknown() {
        let mut value = serde_json::to_value(clip(1, ClipStatus::Ready)).unwrap();
        value["status"] = json!("queued");
        let parsed: Clip = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.status, ClipStatus::Unknown);
        assert!(!parsed.is_playable());
    }

    #[test]
    fn download_filename_uses_cab_for_driver_camera() {
        let mut c = clip(3, ClipStatus::Completed);
        c.camera = Camera::Driver;
        c.start_utc = 1_735_689_600; // 2025-01-01T00:00:00Z
        assert_eq!(c.download_filename(), "SN1_cab_2025-01-01T00-00-00.mp4");
    }
}
