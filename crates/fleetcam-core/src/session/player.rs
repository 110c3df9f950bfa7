// ── Playback resource owned by an active stream session ──

use url::Url;

use crate::error::CoreError;

/// A playback resource attached to a live endpoint.
///
/// The stream controller is the only owner. `dispose` is called exactly
/// once, before the session is reported `Stopped`.
pub trait Player: Send + 'static {
    fn dispose(&mut self);
}

/// Creates a `Player` when a session becomes `Active`.
pub trait PlayerFactory: Send + Sync + 'static {
    type Player: Player;

    fn create(&self, endpoint: &Url) -> Result<Self::Player, CoreError>;
}

/// Headless hosts: nothing to render, nothing to release.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlayback;

#[derive(Debug)]
pub struct NullPlayer;

impl Player for NullPlayer {
    fn dispose(&mut self) {}
}

impl PlayerFactory for NoPlayback {
    type Player = NullPlayer;

    fn create(&self, _endpoint: &Url) -> Result<NullPlayer, CoreError> {
        Ok(NullPlayer)
    }
}
