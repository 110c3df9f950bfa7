// ── Recording availability negotiator ──
//
// Turns a ring summary into a clip request the device will accept. The
// draft can only move through bounded adjustments, so it stays inside its
// region and within the 5..=300 second window the device enforces.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::gateway::CommandGateway;
use crate::model::{
    Camera, ClipRequestDraft, DraftEdge, MAX_CLIP_SECS, MIN_CLIP_SECS, Profile, RecordingRegion,
    StreamKey,
};

/// Negotiates one clip request at a time against one device.
pub struct Negotiator<G: CommandGateway> {
    gateway: Arc<G>,
    /// Serial/camera/profile of the last region fetch.
    target: Option<StreamKey>,
    regions: Vec<RecordingRegion>,
    draft: Option<ClipRequestDraft>,
}

impl<G: CommandGateway> Negotiator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            target: None,
            regions: Vec::new(),
            draft: None,
        }
    }

    /// Ask the device which footage it still holds for `camera`/`profile`.
    ///
    /// An empty result means "no footage", not an error. Regions that are
    /// not strictly increasing are dropped. Any existing draft is discarded.
    pub async fn fetch_regions(
        &mut self,
        serial: &str,
        camera: Camera,
        profile: Profile,
    ) -> Result<Vec<RecordingRegion>, CoreError> {
        let key = StreamKey::new(serial, camera, profile);
        debug!(serial, camera = camera.index(), profile = profile.index(), "fetching ring summary");

        let wire = self.gateway.ring_summary(&key).await?;
        let regions: Vec<RecordingRegion> = wire
            .into_iter()
            .filter_map(|w| {
                RecordingRegion::try_from(w)
                    .inspect_err(|e| warn!(serial, error = %e, "dropping region"))
                    .ok()
            })
            .collect();

        if regions.is_empty() {
            info!(serial, "no footage available for selected camera and profile");
        }

        self.target = Some(key);
        self.regions.clone_from(&regions);
        self.draft = None;
        Ok(regions)
    }

    pub fn regions(&self) -> &[RecordingRegion] {
        &self.regions
    }

    pub fn draft(&self) -> Option<&ClipRequestDraft> {
        self.draft.as_ref()
    }

    /// Start a draft at the beginning of `region`, at most 300 s long.
    pub fn select_region(&mut self, region: RecordingRegion) -> Result<&ClipRequestDraft, CoreError> {
        let start = region.start_utc();
        let end = region.end_utc().min(start.saturating_add(MAX_CLIP_SECS));
        let draft = self.new_draft(region, start, end)?;
        Ok(self.draft.insert(draft))
    }

    /// Build a draft for an explicit range inside `region`.
    pub fn select_range(
        &mut self,
        region: RecordingRegion,
        start_utc: i64,
        end_utc: i64,
    ) -> Result<&ClipRequestDraft, CoreError> {
        let draft = self.new_draft(region, start_utc, end_utc)?;
        draft.validate()?;
        Ok(self.draft.insert(draft))
    }

    /// Move the start by `delta` seconds, clamped to the region and the
    /// duration window. Rejected if the start would not move.
    pub fn adjust_start(&mut self, delta: i64) -> Result<&ClipRequestDraft, CoreError> {
        self.adjust(DraftEdge::Start, delta)
    }

    /// Move the end by `delta` seconds, clamped to the region and the
    /// duration window. Rejected if the end would not move.
    pub fn adjust_end(&mut self, delta: i64) -> Result<&ClipRequestDraft, CoreError> {
        self.adjust(DraftEdge::End, delta)
    }

    /// Whether `adjust_*(delta)` on `edge` would change the draft.
    pub fn can_adjust(&self, edge: DraftEdge, delta: i64) -> bool {
        self.draft.as_ref().is_some_and(|draft| {
            let (current, proposed) = proposal(draft, edge, delta);
            current != proposed
        })
    }

    /// Send the draft to the device.
    ///
    /// Out-of-bounds drafts are rejected here without a request. Success
    /// only means the device accepted; the clip itself shows up later
    /// through the tracker. The draft is kept when the device refuses.
    pub async fn submit(&mut self) -> Result<(), CoreError> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| CoreError::validation("Select a recording region first"))?;
        draft.validate()?;

        info!(
            serial = draft.serial(),
            camera = draft.camera().index(),
            start_utc = draft.start_utc(),
            end_utc = draft.end_utc(),
            "requesting clip"
        );
        if let Err(e) = self.gateway.request_clip(draft).await {
            warn!(serial = draft.serial(), error = %e, "clip request failed");
            return Err(e);
        }

        self.draft = None;
        Ok(())
    }

    /// Throw the draft away.
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    // ── Internals ────────────────────────────────────────────────────

    fn new_draft(
        &self,
        region: RecordingRegion,
        start_utc: i64,
        end_utc: i64,
    ) -> Result<ClipRequestDraft, CoreError> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| CoreError::validation("Fetch recording regions first"))?;
        if !region.contains(start_utc, end_utc) || start_utc >= end_utc {
            return Err(CoreError::validation(format!(
                "Range {start_utc}..{end_utc} is not inside recording region {region}"
            )));
        }
        Ok(ClipRequestDraft {
            serial: target.serial.clone(),
            camera: target.camera,
            profile: target.profile,
            region,
            start_utc,
            end_utc,
        })
    }

    fn adjust(&mut self, edge: DraftEdge, delta: i64) -> Result<&ClipRequestDraft, CoreError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::validation("Select a recording region first"))?;

        let (current, proposed) = proposal(draft, edge, delta);
        if proposed == current {
            return Err(CoreError::validation(format!(
                "Clip {edge} time cannot move any further"
            )));
        }
        match edge {
            DraftEdge::Start => draft.start_utc = proposed,
            DraftEdge::End => draft.end_utc = proposed,
        }
        Ok(draft)
    }
}

/// `(current, proposed)` value of `edge` after moving it by `delta`.
///
/// Region bounds win over the duration window, so a draft never leaves
/// its region even when the region itself is shorter than the minimum.
fn proposal(draft: &ClipRequestDraft, edge: DraftEdge, delta: i64) -> (i64, i64) {
    let region = draft.region;
    match edge {
        DraftEdge::Start => {
            let lower = region
                .start_utc()
                .max(draft.end_utc.saturating_sub(MAX_CLIP_SECS));
            let upper = draft.end_utc.saturating_sub(MIN_CLIP_SECS);
            let moved = draft.start_utc.saturating_add(delta);
            (draft.start_utc, moved.min(upper).max(lower))
        }
        DraftEdge::End => {
            let lower = draft.start_utc.saturating_add(MIN_CLIP_SECS);
            let moved = draft.end_utc.saturating_add(delta);
            let clamped = moved.max(lower).min(region.end_utc());
            (
                draft.end_utc,
                clamped.min(draft.start_utc.saturating_add(MAX_CLIP_SECS)),
            )
        }
    }
}
