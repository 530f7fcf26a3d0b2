//! Flag overrides on top of `clashctl_config` profiles.
//!
//! This is the single place where CLI flags, the TOML profile and the
//! environment meet to produce a `ClientConfig`.

use std::time::Duration;

use clashctl_config::{self as config, Config, Defaults};
use clashctl_core::ClientConfig;
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = config::load_config_or_default();
    resolve(&cfg, global)
}

/// Precedence: flag (or its env var) > profile > defaults.
fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let profile_name = cfg.profile_name(global.profile.as_deref());

    let mut client = match (cfg.profiles.get(profile_name), global.api.as_deref()) {
        (Some(profile), _) => {
            // An explicit --api still wins over the profile's URL.
            let mut profile = profile.clone();
            if let Some(api) = global.api.as_deref() {
                api.clone_into(&mut profile.api);
            }
            config::profile_to_client_config(&profile, profile_name, &cfg.defaults)?
        }
        (None, Some(api)) => from_defaults(api, &cfg.defaults)?,
        (None, None) if global.profile.is_some() => {
            return Err(CliError::UnknownProfile {
                name: profile_name.to_owned(),
                available: available_profiles(cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config::config_path().display().to_string(),
            });
        }
    };

    if let Some(ref secret) = global.secret {
        client.secret = Some(SecretString::from(secret.clone()));
    }
    if global.insecure {
        client.insecure = true;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(profile = profile_name, url = %client.url, "resolved daemon");
    Ok(client)
}

fn from_defaults(api: &str, defaults: &Defaults) -> Result<ClientConfig, CliError> {
    let mut client = ClientConfig::new(config::parse_api_url(api)?);
    client.timeout = Duration::from_secs(defaults.timeout);
    client.refresh_interval_secs = defaults.refresh_interval;
    client.probe_url.clone_from(&defaults.probe_url);
    client.probe_timeout_ms = defaults.probe_timeout_ms;
    Ok(client)
}

pub(crate) fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
