// Wire types for the device command gateway.
//
// These mirror the gateway's JSON shapes exactly; camera and profile are
// raw integers here. Domain meaning is attached in fleetcam-core.

use serde::{Deserialize, Serialize};

/// Command type for a ring-buffer summary request.
pub const RING_SUMMARY_COMMAND: &str = "request_ring_summary";

// ── Generic envelope ─────────────────────────────────────────────────

/// The `{ ok, error }` part every gateway response carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// An explicit `ok: false` is a rejection; a missing flag is not.
    pub fn is_rejection(&self) -> bool {
        self.ok == Some(false)
    }
}

/// Generic `{ type, payload }` command body for `/command`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<P: Serialize> {
    #[serde(rename = "type")]
    pub command_type: String,
    pub payload: P,
}

/// Camera/profile selector used by several payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamSelector {
    pub camera: u8,
    pub profile: u8,
}

// ── Live stream ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartStreamRequest {
    pub camera: u8,
    pub profile: u8,
    /// Stream period in seconds; 0 asks the device for an open-ended feed.
    pub period: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartStreamResponse {
    #[serde(default)]
    pub ok: bool,
    /// HLS playlist path or URL, usually relative to the gateway host.
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Feed state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Active,
    Stopped,
    /// Anything else (`starting`, `pending`, ...): not settled yet.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamStatusResponse {
    pub status: FeedStatus,
    #[serde(default)]
    pub stream_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopStreamResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Ring summary ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionWire {
    pub start_utc: i64,
    pub end_utc: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingProfile {
    pub profile: u8,
    #[serde(default)]
    pub regions: Option<Vec<RegionWire>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ring {
    #[serde(default)]
    pub profiles: Vec<RingProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingSummaryData {
    #[serde(default)]
    pub camera: Option<u8>,
    #[serde(default)]
    pub ring: Ring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingSummaryResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<RingSummaryData>,
}

impl RingSummaryResponse {
    /// Regions reported for `profile`, or an empty slice when the device
    /// has no footage for it.
    pub fn regions_for(&self, profile: u8) -> &[RegionWire] {
        self.data
            .as_ref()
            .and_then(|d| d.ring.profiles.iter().find(|p| p.profile == profile))
            .and_then(|p| p.regions.as_deref())
            .unwrap_or_default()
    }
}

// ── Clip request ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipRequest {
    pub camera: u8,
    pub profile: u8,
    pub start_utc: i64,
    pub end_utc: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipRequestResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_feed_status_is_unsettled() {
        let resp: StreamStatusResponse =
            serde_json::from_value(json!({ "status": "starting" })).unwrap();
        assert_eq!(resp.status, FeedStatus::Unknown);
    }

    #[test]
    fn regions_for_missing_profile_is_empty() {
        let resp: RingSummaryResponse = serde_json::from_value(json!({
            "ok": true,
            "data": {
                "camera": 0,
                "ring": { "profiles": [
                    { "profile": 0, "regions": [{ "start_utc": 10, "end_utc": 20 }] },
                    { "profile": 1 }
                ]}
            }
        }))
        .unwrap();

        assert_eq!(resp.regions_for(0).len(), 1);
        assert!(resp.regions_for(1).is_empty());
        assert!(resp.regions_for(7).is_empty());
    }

    #[test]
    fn command_request_uses_type_key() {
        let body = CommandRequest {
            command_type: RING_SUMMARY_COMMAND.into(),
            payload: StreamSelector {
                camera: 1,
                profile: 0,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "type": "request_ring_summary", "payload": { "camera": 1, "profile": 0 } })
        );
    }
}
