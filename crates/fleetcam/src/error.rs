//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fleetcam_config::ConfigError;
use fleetcam_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const VALIDATION: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the command gateway")]
    #[diagnostic(
        code(fleetcam::connection_failed),
        help(
            "{reason}\n\
             Check the gateway URL in your profile or pass --gateway."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Gateway request timed out")]
    #[diagnostic(
        code(fleetcam::timeout),
        help("Increase the timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(fleetcam::auth_failed),
        help(
            "{message}\n\
             Verify the API key for profile '{profile}' or set FLEETCAM_API_KEY."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(fleetcam::no_credentials),
        help(
            "Pass --api-key, set FLEETCAM_API_KEY, store one in the system keyring\n\
             (service 'fleetcam', account '{profile}/api-key'), or add api_key_env to the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Device commands ──────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(fleetcam::command_failed))]
    CommandFailed { message: String, status: Option<u16> },

    #[error("A stream for {key} is already running in this session")]
    #[diagnostic(code(fleetcam::session_busy), help("Stop the existing stream first."))]
    SessionBusy { key: String },

    #[error("Stream failed: {message}")]
    #[diagnostic(code(fleetcam::stream_failed))]
    StreamFailed { message: String },

    #[error("Operation cancelled: {reason}")]
    #[diagnostic(code(fleetcam::cancelled))]
    Cancelled { reason: String },

    // ── Footage ──────────────────────────────────────────────────────
    #[error("No footage available for {serial} ({camera}, {quality})")]
    #[diagnostic(
        code(fleetcam::no_footage),
        help("The unit's recording ring holds nothing for this camera and quality.")
    )]
    NoFootage {
        serial: String,
        camera: String,
        quality: String,
    },

    #[error("Recording region {index} not found")]
    #[diagnostic(
        code(fleetcam::region_not_found),
        help("Run: fleetcam footage regions {serial} to see available regions")
    )]
    RegionNotFound { index: usize, serial: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(fleetcam::validation))]
    Validation { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fleetcam::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No gateway configured")]
    #[diagnostic(
        code(fleetcam::no_config),
        help(
            "Pass --gateway, set FLEETCAM_GATEWAY, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fleetcam::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(fleetcam::json), help("Check the clip records and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } | Self::RegionNotFound { .. } | Self::NoFootage { .. } => {
                exit_code::NOT_FOUND
            }
            Self::SessionBusy { .. } => exit_code::CONFLICT,
            Self::NoConfig { .. } => exit_code::USAGE,
            Self::Validation { .. } | Self::Json(_) => exit_code::VALIDATION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Command {
                message,
                status: None,
            } => CliError::ConnectionFailed { reason: message },
            CoreError::Command { message, status } => CliError::CommandFailed { message, status },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::Timeout { .. } => CliError::Timeout,
            CoreError::Validation { message } => CliError::Validation { message },
            CoreError::SessionBusy { key } => CliError::SessionBusy { key },
            CoreError::Cancelled { reason } => CliError::Cancelled { reason },
            CoreError::Config { message }
            | CoreError::Storage { message }
            | CoreError::Internal(message) => CliError::StreamFailed { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::MissingGateway { .. } => CliError::NoConfig {
                path: fleetcam_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation {
                message: format!("{field}: {reason}"),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}
