// ── Runtime connection configuration ──
//
// Describes how to reach one daemon. Never touches disk: the CLI builds a
// `ClientConfig` from its profile and hands it to the `Controller`.

use std::time::Duration;

use clashctl_api::{ClashClient, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_PROBE_URL, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Configuration for connecting to a single daemon.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// External controller URL (e.g., `http://127.0.0.1:9090`).
    pub url: Url,
    /// Static bearer secret. `None` means no Authorization header.
    pub secret: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
    /// Seconds between background refreshes. 0 = never.
    pub refresh_interval_secs: u64,
    /// Target fetched through each proxy during a latency probe.
    pub probe_url: String,
    /// Per-probe timeout passed to the daemon.
    pub probe_timeout_ms: u32,
    /// Accept self-signed certificates.
    pub insecure: bool,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            secret: None,
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 30,
            probe_url: DEFAULT_PROBE_URL.to_owned(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            insecure: false,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            secret: self.secret.clone(),
            accept_invalid_certs: self.insecure,
        }
    }

    /// Build the API client this configuration describes.
    pub fn build_client(&self) -> Result<ClashClient, CoreError> {
        Ok(ClashClient::new(self.url.clone(), &self.transport())?)
    }
}
