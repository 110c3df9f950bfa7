use thiserror::Error;

/// Top-level error type for the `fleetcam-api` crate.
///
/// Covers every failure mode of the gateway surface: transport,
/// authentication, device rejections, and payload decoding.
/// `fleetcam-core` maps these into its operator-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The configured API key cannot be used as a header value.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    /// Gateway answered 401/403.
    #[error("Gateway rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Gateway / device ────────────────────────────────────────────
    /// The gateway or device answered with an `{ ok: false }` envelope.
    #[error("Command rejected: {message}")]
    Rejected { message: String, status: u16 },

    /// Non-success status without a recognisable envelope.
    #[error("Gateway returned HTTP {status}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the device or gateway explicitly refused the command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// HTTP status associated with the failure, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status }
            | Self::Rejected { status, .. }
            | Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
