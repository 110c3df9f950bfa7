// ── Clip ingestion ──
//
// `ClipProjection` is the pure reconciliation core; `ClipTracker` wires it
// to a `ClipFeed` and publishes snapshots.

mod feed;
mod projection;
mod tracker;

pub use feed::ClipFeed;
pub use projection::ClipProjection;
pub use tracker::ClipTracker;
