// ── Live stream sessions ──
//
// `StreamController` owns one session and its playback resource;
// `SessionRegistry` keeps two controllers in the same process from
// owning the same feed.

mod controller;
mod player;
mod registry;

pub use controller::StreamController;
pub use player::{NoPlayback, NullPlayer, Player, PlayerFactory};
pub use registry::SessionRegistry;
