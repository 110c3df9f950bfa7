// ── Live stream session value ──

use serde::Serialize;
use url::Url;

use super::device::StreamKey;

/// Lifecycle state of a live stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StreamState {
    #[default]
    Stopped,
    Starting,
    Active,
    Error,
}

impl StreamState {
    /// `Starting` or `Active`: the remote feed may be running.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Active)
    }
}

/// What a session host renders. Only the stream controller mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StreamSession {
    /// Set on `start()`; kept after stop so hosts can show what ran last.
    pub key: Option<StreamKey>,
    pub state: StreamState,
    pub endpoint: Option<Url>,
    pub last_error: Option<String>,
}

impl StreamSession {
    pub fn is_stopped(&self) -> bool {
        self.state == StreamState::Stopped
    }
}
