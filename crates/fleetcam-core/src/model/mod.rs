// ── Domain model ──
//
// Everything a session host renders or binds to. Wire-level shapes stay
// in fleetcam-api; these types give them camera/profile meaning.

pub mod clip;
pub mod device;
pub mod recording;
pub mod session;

pub use clip::{Clip, ClipChange, ClipId, ClipKey, ClipStatus};
pub use device::{Camera, Profile, StreamKey};
pub use recording::{ClipRequestDraft, DraftEdge, MAX_CLIP_SECS, MIN_CLIP_SECS, RecordingRegion};
pub use session::{StreamSession, StreamState};
