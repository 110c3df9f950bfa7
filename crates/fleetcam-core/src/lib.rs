// fleetcam-core: Stream sessions, footage negotiation and clip tracking
// between fleetcam-api and session hosts (CLI, services).

pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod model;
pub mod negotiator;
pub mod playback;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{GatewayConfig, SessionConfig, TlsVerification};
pub use console::Console;
pub use error::{CoreError, ErrorKind};
pub use gateway::{CommandGateway, StreamStatus};
pub use negotiator::Negotiator;
pub use playback::{ClipStorage, SIGNED_URL_TTL, resolve_playback_url};
pub use session::{NoPlayback, Player, PlayerFactory, SessionRegistry, StreamController};
pub use store::{ClipFeed, ClipProjection, ClipTracker};
pub use stream::ClipStream;

pub use model::{
    Camera, Clip, ClipChange, ClipId, ClipKey, ClipRequestDraft, ClipStatus, DraftEdge,
    MAX_CLIP_SECS, MIN_CLIP_SECS, Profile, RecordingRegion, StreamKey, StreamSession, StreamState,
};

// Wire-level status, re-exported for gateway implementations.
pub use fleetcam_api::types::{FeedStatus, RegionWire};
