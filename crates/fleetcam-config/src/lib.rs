//! Shared configuration for fleetcam tools.
//!
//! TOML profiles, API-key resolution (env + keyring + plaintext), and
//! translation to `fleetcam_core::GatewayConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use fleetcam_core::{GatewayConfig, SessionConfig, TlsVerification};

/// Keyring service name; entries are `{profile}/api-key`.
pub const KEYRING_SERVICE: &str = "fleetcam";

/// Environment variable holding an API key for any profile.
pub const API_KEY_ENV: &str = "FLEETCAM_API_KEY";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "FLEETCAM_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("no gateway URL configured for profile '{profile}'")]
    MissingGateway { profile: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is selected explicitly.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles (e.g. `staging`, `production`).
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between stream status queries while starting.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// `period` sent with stream start commands.
    #[serde(default)]
    pub stream_period: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            stream_period: 0,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    2
}
fn default_max_poll_attempts() -> u32 {
    10
}

/// A named gateway profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Command gateway base URL.
    pub gateway_url: Option<String>,

    /// Where relative HLS stream URLs resolve (defaults to the gateway).
    pub hls_base_url: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `FLEETCAM_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "fleetcam", "fleetcam").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("fleetcam");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `FLEETCAM_*` env vars.
/// Nested keys use a double underscore: `FLEETCAM_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETCAM_").split("__"));

    Ok(figment.extract()?)
}

/// A copy of `cfg` with plaintext API keys masked.
pub fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    for profile in shown.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("********".into());
        }
    }
    shown
}

/// Render the config as TOML with plaintext API keys masked.
pub fn render_redacted(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(&redacted(cfg))?)
}

// ── Profile selection ───────────────────────────────────────────────

/// Map deployment names from `ENV` onto profile names.
pub fn profile_for_env(env: &str) -> &str {
    match env {
        "prod" => "production",
        "stage" => "staging",
        other => other,
    }
}

/// Pick the active profile name: explicit flag, `FLEETCAM_PROFILE`, the
/// `ENV` deployment alias, `default_profile`, then `"default"`.
pub fn active_profile_name(cfg: &Config, explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        return name.to_owned();
    }
    if let Ok(name) = std::env::var("FLEETCAM_PROFILE") {
        return name;
    }
    if let Ok(env) = std::env::var("ENV") {
        let name = profile_for_env(&env);
        if cfg.profiles.contains_key(name) {
            return name.to_owned();
        }
    }
    cfg.default_profile
        .clone()
        .unwrap_or_else(|| "default".into())
}

/// Look a profile up by name.
pub fn find_profile<'a>(cfg: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    cfg.profiles
        .get(name)
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.into(),
            available: if cfg.profiles.is_empty() {
                "none".into()
            } else {
                cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            },
        })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key: profile `api_key_env` → `FLEETCAM_API_KEY` →
/// system keyring → plaintext in config.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Tool-wide env var
    if let Ok(val) = std::env::var(API_KEY_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to core config ──────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Session tuning from `[defaults]`.
pub fn session_config(defaults: &Defaults) -> Result<SessionConfig, ConfigError> {
    if defaults.max_poll_attempts == 0 {
        return Err(ConfigError::Validation {
            field: "defaults.max_poll_attempts".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(SessionConfig {
        poll_interval: Duration::from_secs(defaults.poll_interval_secs),
        max_poll_attempts: defaults.max_poll_attempts,
        stream_period: defaults.stream_period,
        hls_base_url: None,
    })
}

/// Build a `GatewayConfig` from a profile, resolving its API key.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    if profile.gateway_url.is_none() {
        return Err(ConfigError::MissingGateway {
            profile: profile_name.into(),
        });
    }
    let api_key = resolve_api_key(profile, profile_name)?;
    build_gateway_config(profile, profile_name, defaults, api_key)
}

/// Build a `GatewayConfig` from a profile with an already-chosen API key.
pub fn build_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<GatewayConfig, ConfigError> {
    let raw_url = profile
        .gateway_url
        .as_deref()
        .ok_or_else(|| ConfigError::MissingGateway {
            profile: profile_name.into(),
        })?;
    let url = parse_url("gateway_url", raw_url)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut session = session_config(defaults)?;
    session.hls_base_url = profile
        .hls_base_url
        .as_deref()
        .map(|raw| parse_url("hls_base_url", raw))
        .transpose()?;

    Ok(GatewayConfig {
        url,
        api_key,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        session,
    })
}
