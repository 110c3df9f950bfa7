// ── Runtime gateway and session configuration ──
//
// These types describe *how* to reach the command gateway and how a stream
// session behaves. They carry credentials and tuning but never touch disk:
// fleetcam-config (or any other host) builds them and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use fleetcam_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (lab gateways with self-signed certs).
    DangerAcceptInvalid,
}

/// How to reach the command gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway URL (e.g., `https://gateway.example.com`).
    pub url: Url,
    /// Bearer API key.
    pub api_key: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub session: SessionConfig,
}

impl GatewayConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            session: SessionConfig::default(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}

/// Live-stream session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Period between status queries while `Starting`, measured from the
    /// start command rather than from the previous reply.
    pub poll_interval: Duration,
    /// Status queries before the start is declared failed.
    pub max_poll_attempts: u32,
    /// `period` sent with the start command; 0 lets the device pick.
    pub stream_period: u32,
    /// Base that relative `stream_url`s are joined onto. Defaults to the
    /// gateway URL when unset.
    pub hls_base_url: Option<Url>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 10,
            stream_period: 0,
            hls_base_url: None,
        }
    }
}
