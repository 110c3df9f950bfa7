//! Flag overrides layered on top of `fleetcam-config` profiles.
//!
//! This is the single place where CLI flags cross into
//! `fleetcam_core::GatewayConfig`.

use secrecy::SecretString;

use fleetcam_config::{self as cfg, Config, Profile};
use fleetcam_core::GatewayConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build the gateway config from the config file, profile, and flags.
///
/// Flags win over the profile. Without any profile, `--gateway` plus a key
/// from `--api-key` or the environment is enough.
pub fn build_gateway_config(global: &GlobalOpts) -> Result<GatewayConfig, CliError> {
    let config = cfg::load_config()?;
    gateway_config_from(&config, global)
}

pub fn gateway_config_from(config: &Config, global: &GlobalOpts) -> Result<GatewayConfig, CliError> {
    let profile_name = cfg::active_profile_name(config, global.profile.as_deref());

    let mut profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.gateway.is_some() => Profile::default(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            cfg::find_profile(config, &profile_name)?;
            Profile::default()
        }
        None => {
            return Err(CliError::NoConfig {
                path: cfg::config_path().display().to_string(),
            });
        }
    };

    if let Some(ref url) = global.gateway {
        profile.gateway_url = Some(url.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let gateway = match global.api_key {
        Some(ref key) => cfg::build_gateway_config(
            &profile,
            &profile_name,
            &config.defaults,
            SecretString::from(key.clone()),
        )?,
        None => cfg::profile_to_gateway_config(&profile, &profile_name, &config.defaults)?,
    };
    Ok(gateway)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::{ColorMode, OutputFormat};
    use std::time::Duration;

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            gateway: None,
            api_key: None,
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
            insecure: false,
            timeout: None,
        }
    }

    fn config_with_staging() -> Config {
        let mut config = Config::default();
        config.default_profile = Some("staging".into());
        config.profiles.insert(
            "staging".into(),
            Profile {
                gateway_url: Some("https://staging-gw.example.com".into()),
                timeout: Some(10),
                ..Profile::default()
            },
        );
        config
    }

    #[test]
    fn flags_override_profile() {
        let mut global = global();
        global.gateway = Some("https://other.example.com".into());
        global.api_key = Some("flag-key".into());
        global.timeout = Some(5);
        global.insecure = true;

        let gw = gateway_config_from(&config_with_staging(), &global).unwrap();
        assert_eq!(gw.url.as_str(), "https://other.example.com/");
        assert_eq!(gw.timeout, Duration::from_secs(5));
        assert_eq!(gw.tls, fleetcam_core::TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn gateway_flag_works_without_profiles() {
        let mut global = global();
        global.gateway = Some("https://gw.example.com".into());
        global.api_key = Some("k".into());

        let gw = gateway_config_from(&Config::default(), &global).unwrap();
        assert_eq!(gw.url.as_str(), "https://gw.example.com/");
        assert_eq!(gw.timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_everything_is_no_config() {
        let err = gateway_config_from(&Config::default(), &global()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let mut global = global();
        global.profile = Some("production".into());
        let err = gateway_config_from(&config_with_staging(), &global).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { .. }));
    }
}
