// ── Console: the session host's entry point ──
//
// Builds the gateway client once and hands out the controllers and
// negotiators that share it. All controllers from one Console share a
// SessionRegistry, so two of them cannot own the same feed.

use std::sync::Arc;

use fleetcam_api::GatewayClient;
use tracing::debug;

use crate::config::{GatewayConfig, SessionConfig};
use crate::error::CoreError;
use crate::gateway::CommandGateway;
use crate::negotiator::Negotiator;
use crate::session::{NoPlayback, PlayerFactory, SessionRegistry, StreamController};

pub struct Console<G: CommandGateway = GatewayClient> {
    gateway: Arc<G>,
    session: SessionConfig,
    registry: SessionRegistry,
}

impl Console<GatewayClient> {
    /// Connect-free setup: validates the URL and key and builds the HTTP
    /// client. Relative stream URLs resolve against the gateway unless an
    /// HLS base is configured.
    pub fn new(config: GatewayConfig) -> Result<Self, CoreError> {
        let client = GatewayClient::new(config.url.as_str(), &config.api_key, &config.transport())?;
        let mut session = config.session;
        if session.hls_base_url.is_none() {
            session.hls_base_url = Some(config.url);
        }
        debug!(gateway = %client.base_url(), "console ready");
        Ok(Self::with_gateway(Arc::new(client), session))
    }
}

impl<G: CommandGateway> Console<G> {
    pub fn with_gateway(gateway: Arc<G>, session: SessionConfig) -> Self {
        Self {
            gateway,
            session,
            registry: SessionRegistry::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    /// A headless stream controller.
    pub fn stream_controller(&self) -> StreamController<G, NoPlayback> {
        StreamController::new(
            Arc::clone(&self.gateway),
            self.session.clone(),
            self.registry.clone(),
        )
    }

    /// A stream controller that opens a player once the feed is active.
    pub fn stream_controller_with<P: PlayerFactory>(&self, players: P) -> StreamController<G, P> {
        StreamController::with_players(
            Arc::clone(&self.gateway),
            players,
            self.session.clone(),
            self.registry.clone(),
        )
    }

    pub fn negotiator(&self) -> Negotiator<G> {
        Negotiator::new(Arc::clone(&self.gateway))
    }
}
