//! Configuration for clashctl.
//!
//! TOML profiles, secret resolution (env + keyring + plaintext), and
//! translation to `clashctl_core::ClientConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clashctl_core::ClientConfig;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name; entries are keyed `<profile>/secret`.
pub const KEYRING_SERVICE: &str = "clashctl";

/// Prefix for environment overrides (`CLASHCTL_DEFAULTS__TIMEOUT=10`).
pub const ENV_PREFIX: &str = "CLASHCTL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named daemon profiles.
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

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between refreshes for `watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
            probe_url: default_probe_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_interval() -> u64 {
    30
}
fn default_probe_url() -> String {
    clashctl_core::DEFAULT_PROBE_URL.into()
}
fn default_probe_timeout_ms() -> u32 {
    clashctl_core::DEFAULT_PROBE_TIMEOUT_MS
}

/// A named daemon profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// External controller URL (e.g., "http://127.0.0.1:9090").
    pub api: String,

    /// Secret (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Environment variable name containing the secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,

    /// Accept self-signed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "clashctl", "clashctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("clashctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) + `CLASHCTL_*` environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution (without CLI flags) ───────────────────────────

/// Resolve the profile's secret: `secret_env` -> keyring -> plaintext.
///
/// `None` is valid and means no Authorization header is sent.
pub fn resolve_secret(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's secret_env -> env var lookup
    if let Some(ref env_name) = profile.secret_env {
        if let Ok(val) = std::env::var(env_name) {
            debug!(profile = profile_name, "secret from environment");
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            debug!(profile = profile_name, "secret from keyring");
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .secret
        .as_ref()
        .map(|s| SecretString::from(s.clone()))
}

/// Store a profile's secret in the system keyring.
pub fn store_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(secret)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/secret")
}

/// Parse and check a controller URL.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "api".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Build a `ClientConfig` from a profile, no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url = parse_api_url(&profile.api)?;

    let mut config = ClientConfig::new(url);
    config.secret = resolve_secret(profile, profile_name);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.refresh_interval_secs = defaults.refresh_interval;
    config.probe_url.clone_from(&defaults.probe_url);
    config.probe_timeout_ms = defaults.probe_timeout_ms;
    config.insecure = profile.insecure.unwrap_or(false);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(api: &str) -> Profile {
        Profile {
            api: api.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    default_profile = "home"

                    [defaults]
                    output = "json"

                    [profiles.home]
                    api = "http://192.168.1.2:9090"
                    secret_env = "HOME_CLASH_SECRET"

                    [profiles.vps]
                    api = "https://clash.example.com"
                    secret = "plain"
                    timeout = 5
                "#,
            )?;

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.profile_name(None), "home");
            assert_eq!(config.profile_name(Some("vps")), "vps");
            assert_eq!(config.defaults.output, "json");
            assert_eq!(config.defaults.timeout, 30);
            assert_eq!(config.profiles.len(), 2);
            assert_eq!(config.profile("vps").unwrap().timeout, Some(5));
            assert!(matches!(
                config.profile("nope"),
                Err(ConfigError::UnknownProfile { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[defaults]\ntimeout = 10\n")?;
            jail.set_env("CLASHCTL_DEFAULTS__TIMEOUT", "3");
            jail.set_env("CLASHCTL_DEFAULT_PROFILE", "work");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.defaults.timeout, 3);
            assert_eq!(config.default_profile.as_deref(), Some("work"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config
            .profiles
            .insert("default".into(), profile("http://127.0.0.1:9090"));
        save_config_to(&config, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("[profiles.default]"));
        assert!(!raw.contains("secret"));

        let loaded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn secret_env_beats_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("CLASHCTL_TEST_SECRET_A", "from-env");
            let mut p = profile("http://127.0.0.1:9090");
            p.secret_env = Some("CLASHCTL_TEST_SECRET_A".into());
            p.secret = Some("plain".into());

            let secret = resolve_secret(&p, "secret-env-test").unwrap();
            assert_eq!(secret.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn plaintext_secret_and_none() {
        let mut p = profile("http://127.0.0.1:9090");
        p.secret_env = Some("CLASHCTL_TEST_SECRET_UNSET".into());
        assert!(resolve_secret(&p, "clashctl-test-no-keyring").is_none());

        p.secret = Some("plain".into());
        let secret = resolve_secret(&p, "clashctl-test-no-keyring").unwrap();
        assert_eq!(secret.expose_secret(), "plain");
    }

    #[test]
    fn client_config_from_profile() {
        let mut p = profile("https://clash.example.com/api/");
        p.timeout = Some(7);
        p.insecure = Some(true);
        let defaults = Defaults {
            refresh_interval: 15,
            probe_timeout_ms: 2500,
            ..Defaults::default()
        };

        let config = profile_to_client_config(&p, "clashctl-test-no-keyring", &defaults).unwrap();
        assert_eq!(config.url.as_str(), "https://clash.example.com/api/");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.refresh_interval_secs, 15);
        assert_eq!(config.probe_timeout_ms, 2500);
        assert_eq!(config.probe_url, "http://www.gstatic.com/generate_204");
        assert!(config.insecure);
        assert!(config.secret.is_none());
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            parse_api_url("not a url"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(matches!(
            parse_api_url("ftp://router.lan"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(parse_api_url("http://127.0.0.1:9090").is_ok());
    }
}
