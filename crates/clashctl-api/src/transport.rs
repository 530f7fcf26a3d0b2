// Shared transport configuration for building reqwest::Client instances.
//
// The bearer secret is injected once as a default header so every request
// carries it without per-call plumbing.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("clashctl/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Static bearer secret. `None` or empty means no Authorization header.
    pub secret: Option<SecretString>,
    /// Accept self-signed certificates on `https` controllers.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            secret: None,
            accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    /// Returns the secret if one is configured and non-empty.
    pub fn active_secret(&self) -> Option<&str> {
        self.secret
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|s| !s.is_empty())
    }

    /// Default headers sent with every request.
    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(secret) = self.active_secret() {
            let mut value = HeaderValue::from_str(&format!("Bearer {secret}"))
                .map_err(|e| Error::ClientBuild(format!("invalid secret: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(self.default_headers()?)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Set the bearer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_sends_no_header() {
        let config = TransportConfig::default().with_secret("");
        assert!(config.active_secret().is_none());
        assert!(config.default_headers().unwrap().is_empty());
    }

    #[test]
    fn secret_becomes_sensitive_bearer_header() {
        let config = TransportConfig::default().with_secret("s3cret");
        let headers = config.default_headers().unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer s3cret");
    }

    #[test]
    fn secret_with_newline_is_rejected() {
        let config = TransportConfig::default().with_secret("bad\nsecret");
        assert!(matches!(config.build_client(), Err(Error::ClientBuild(_))));
    }
}
