// ── Ring-buffer regions and clip request drafts ──

use std::fmt;

use serde::Serialize;

use fleetcam_api::types::{ClipRequest, RegionWire};

use super::device::{Camera, Profile};
use crate::error::CoreError;

/// Shortest clip the device will cut, in seconds.
pub const MIN_CLIP_SECS: i64 = 5;
/// Longest clip the device will cut, in seconds.
pub const MAX_CLIP_SECS: i64 = 300;

/// A span of retained footage reported by the device.
///
/// Construct through `new`/`TryFrom`; `end_utc > start_utc` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordingRegion {
    start_utc: i64,
    end_utc: i64,
}

impl RecordingRegion {
    pub fn new(start_utc: i64, end_utc: i64) -> Result<Self, CoreError> {
        if end_utc <= start_utc {
            return Err(CoreError::validation(format!(
                "Invalid recording region: end {end_utc} is not after start {start_utc}"
            )));
        }
        Ok(Self { start_utc, end_utc })
    }

    pub fn start_utc(&self) -> i64 {
        self.start_utc
    }

    pub fn end_utc(&self) -> i64 {
        self.end_utc
    }

    pub fn duration_secs(&self) -> i64 {
        self.end_utc.saturating_sub(self.start_utc)
    }

    pub fn contains(&self, start_utc: i64, end_utc: i64) -> bool {
        self.start_utc <= start_utc && end_utc <= self.end_utc
    }
}

impl TryFrom<RegionWire> for RecordingRegion {
    type Error = CoreError;

    fn try_from(wire: RegionWire) -> Result<Self, Self::Error> {
        Self::new(wire.start_utc, wire.end_utc)
    }
}

impl fmt::Display for RecordingRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_utc, self.end_utc)
    }
}

/// Which end of a draft an adjustment moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DraftEdge {
    Start,
    End,
}

/// The clip request being edited by an operator.
///
/// Fields are read-only outside the crate; the negotiator is the only
/// writer and keeps `start_utc`/`end_utc` inside `region`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipRequestDraft {
    pub(crate) serial: String,
    pub(crate) camera: Camera,
    pub(crate) profile: Profile,
    pub(crate) region: RecordingRegion,
    pub(crate) start_utc: i64,
    pub(crate) end_utc: i64,
}

impl ClipRequestDraft {
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn region(&self) -> RecordingRegion {
        self.region
    }

    pub fn start_utc(&self) -> i64 {
        self.start_utc
    }

    pub fn end_utc(&self) -> i64 {
        self.end_utc
    }

    pub fn duration_secs(&self) -> i64 {
        self.end_utc.saturating_sub(self.start_utc)
    }

    /// Check the duration bounds the device enforces.
    pub fn validate(&self) -> Result<(), CoreError> {
        let span = self.duration_secs();
        if span < MIN_CLIP_SECS {
            return Err(CoreError::validation(format!(
                "Clip duration must be at least {MIN_CLIP_SECS} seconds"
            )));
        }
        if span > MAX_CLIP_SECS {
            return Err(CoreError::validation(format!(
                "Clip duration cannot exceed 5 minutes ({MAX_CLIP_SECS} seconds)"
            )));
        }
        if !self.region.contains(self.start_utc, self.end_utc) {
            return Err(CoreError::validation(format!(
                "Clip {}..{} lies outside recording region {}",
                self.start_utc, self.end_utc, self.region
            )));
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> ClipRequest {
        ClipRequest {
            camera: self.camera.index(),
            profile: self.profile.index(),
            start_utc: self.start_utc,
            end_utc: self.end_utc,
        }
    }
}
