// fleetcam-api: Async Rust client for the fleetcam device command gateway

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::GatewayClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
