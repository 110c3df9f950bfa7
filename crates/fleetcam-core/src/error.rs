// ── Core error types ──
//
// User-facing errors from fleetcam-core. Consumers never see raw HTTP
// status handling or JSON decode failures; the `From<fleetcam_api::Error>`
// impl folds transport-layer errors into the command/timeout/config classes.

use thiserror::Error;

/// Coarse error class, used by hosts to pick exit codes and wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid upstream configuration. Never retried.
    Config,
    /// Remote command rejected, or the gateway could not be reached.
    Command,
    /// A request or the stream-start poll budget ran out.
    Timeout,
    /// A local bound was violated before anything hit the wire.
    Validation,
    /// The operation was superseded by a stop or dispose.
    Cancelled,
    Internal,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Remote commands ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    Command {
        message: String,
        /// HTTP status of the gateway reply, when there was one.
        status: Option<u16>,
    },

    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Local validation ─────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("A stream session for {key} is already running")]
    SessionBusy { key: String },

    #[error("Operation cancelled: {reason}")]
    Cancelled { reason: String },

    // ── Storage collaborator ─────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
            status: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::AuthenticationFailed { .. } | Self::Command { .. } | Self::Storage { .. } => {
                ErrorKind::Command
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Validation { .. } | Self::SessionBusy { .. } => ErrorKind::Validation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetcam_api::Error> for CoreError {
    fn from(err: fleetcam_api::Error) -> Self {
        match err {
            fleetcam_api::Error::InvalidApiKey { message } => CoreError::Config {
                message: format!("Invalid API key: {message}"),
            },
            fleetcam_api::Error::Unauthorized { status } => CoreError::AuthenticationFailed {
                message: format!("gateway refused the API key (HTTP {status})"),
            },
            fleetcam_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::Command {
                        message: format!(
                            "Cannot reach gateway at {}: {e}",
                            e.url().map_or_else(|| "<unknown>".into(), ToString::to_string)
                        ),
                        status: None,
                    }
                } else {
                    CoreError::Command {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            fleetcam_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid gateway URL: {e}"),
            },
            fleetcam_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            fleetcam_api::Error::Tls(msg) => CoreError::Command {
                message: format!("TLS error: {msg}"),
                status: None,
            },
            fleetcam_api::Error::Rejected { message, status } => CoreError::Command {
                message,
                status: Some(status),
            },
            fleetcam_api::Error::Http { status, body } => CoreError::Command {
                message: if body.trim().is_empty() {
                    format!("Gateway returned HTTP {status}")
                } else {
                    format!("Gateway returned HTTP {status}: {}", body.trim())
                },
                status: Some(status),
            },
            fleetcam_api::Error::Deserialization { message, body: _ } => CoreError::Command {
                message: format!("Unexpected gateway response: {message}"),
                status: None,
            },
        }
    }
}
