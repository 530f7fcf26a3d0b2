// Controller API HTTP client
//
// Wraps `reqwest::Client` with URL construction, status interpretation and
// wire-envelope unwrapping. Reads surface failures as errors; mutations
// report success as a boolean (HTTP 204) and only fail on transport errors.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ApiMessage, ConfigPatch, DelayResponse, LogEntry, LogLevel, Mode, ProvidersResponse,
    ProxiesResponse, Proxy, ProxyProvider, Rule, RuleProvider, RulesResponse, RuntimeConfig,
    Traffic,
};
use crate::stream::JsonLineStream;
use crate::transport::TransportConfig;

/// Probe target used when the caller does not supply one.
pub const DEFAULT_PROBE_URL: &str = "http://www.gstatic.com/generate_204";

/// Per-probe timeout used when the caller does not supply one.
pub const DEFAULT_PROBE_TIMEOUT_MS: u32 = 5000;

/// Result of a single latency probe, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelayOutcome {
    /// Round-trip time in milliseconds.
    Measured(u32),
    /// The daemon reported a timeout or an unreachable target.
    Failed { status: u16, message: String },
}

impl DelayOutcome {
    /// Wire-compatible value: failures collapse to `0`.
    pub fn as_millis(&self) -> u32 {
        match self {
            Self::Measured(ms) => *ms,
            Self::Failed { .. } => 0,
        }
    }
}

/// Typed client for a single daemon's external controller.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted. No
/// operation retries internally.
#[derive(Debug, Clone)]
pub struct ClashClient {
    http: reqwest::Client,
    base_url: Url,
    secret: Option<String>,
}

impl ClashClient {
    /// Create a client for the controller at `base_url`
    /// (e.g. `http://127.0.0.1:9090`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            secret: transport.active_secret().map(str::to_owned),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The secret is only used for the WebSocket streams; the HTTP client is
    /// expected to carry its own Authorization header if one is needed.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        secret: Option<String>,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            secret: secret.filter(|s| !s.is_empty()),
        })
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Configuration ────────────────────────────────────────────────

    /// `GET /configs`
    pub async fn get_config(&self) -> Result<RuntimeConfig, Error> {
        self.get_json(self.url(&["configs"])?).await
    }

    /// `PATCH /configs`. Returns `true` iff the daemon answered 204.
    pub async fn set_config(&self, patch: &ConfigPatch) -> Result<bool, Error> {
        self.send_mutation(reqwest::Method::PATCH, self.url(&["configs"])?, Some(patch))
            .await
    }

    /// Current routing mode.
    pub async fn get_mode(&self) -> Result<Mode, Error> {
        Ok(self.get_config().await?.mode)
    }

    /// Switch the routing mode. Returns `true` iff the daemon answered 204.
    pub async fn set_mode(&self, mode: Mode) -> Result<bool, Error> {
        self.set_config(&ConfigPatch::mode(mode)).await
    }

    // ── Rules ────────────────────────────────────────────────────────

    /// `GET /rules`, in daemon match order.
    pub async fn get_rules(&self) -> Result<Vec<Rule>, Error> {
        let resp: RulesResponse = self.get_json(self.url(&["rules"])?).await?;
        Ok(resp.rules)
    }

    /// `GET /providers/rules`. Wire keys are dropped; each record carries its name.
    pub async fn get_rule_providers(&self) -> Result<Vec<RuleProvider>, Error> {
        let resp: ProvidersResponse<RuleProvider> =
            self.get_json(self.url(&["providers", "rules"])?).await?;
        Ok(resp.providers.into_values().collect())
    }

    // ── Proxies ──────────────────────────────────────────────────────

    /// `GET /proxies` as a flat list, each record stamped with its wire key.
    pub async fn get_proxies(&self) -> Result<Vec<Proxy>, Error> {
        let resp: ProxiesResponse = self.get_json(self.url(&["proxies"])?).await?;
        Ok(resp
            .proxies
            .into_iter()
            .map(|(name, mut proxy)| {
                proxy.name = name;
                proxy
            })
            .collect())
    }

    /// `GET /proxies/{name}`
    pub async fn get_proxy(&self, name: &str) -> Result<Proxy, Error> {
        let mut proxy: Proxy = self.get_json(self.url(&["proxies", name])?).await?;
        if proxy.name.is_empty() {
            name.clone_into(&mut proxy.name);
        }
        Ok(proxy)
    }

    /// `PUT /proxies/{selector}` with `{name}`. Returns `true` iff 204.
    pub async fn switch_selection(&self, selector: &str, name: &str) -> Result<bool, Error> {
        #[derive(Serialize)]
        struct Selection<'a> {
            name: &'a str,
        }

        self.send_mutation(
            reqwest::Method::PUT,
            self.url(&["proxies", selector])?,
            Some(&Selection { name }),
        )
        .await
    }

    /// Latency probe through `name`, normalized to milliseconds.
    ///
    /// A daemon-reported failure (timeout, unreachable) yields `0` rather
    /// than an error. Transport failures still propagate.
    pub async fn delay(&self, name: &str, url: &str, timeout_ms: u32) -> Result<u32, Error> {
        Ok(self.delay_outcome(name, url, timeout_ms).await?.as_millis())
    }

    /// Latency probe through `name`, keeping the failure detail.
    pub async fn delay_outcome(
        &self,
        name: &str,
        url: &str,
        timeout_ms: u32,
    ) -> Result<DelayOutcome, Error> {
        let mut endpoint = self.url(&["proxies", name, "delay"])?;
        endpoint
            .query_pairs_mut()
            .append_pair("url", url)
            .append_pair("timeout", &timeout_ms.to_string());

        debug!("GET {}", endpoint);
        let resp = self.http.get(endpoint).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: Option<DelayResponse> = serde_json::from_str(&body).ok();

        if status.is_success() {
            if let Some(ms) = parsed.as_ref().and_then(|d| d.delay).filter(|ms| *ms > 0) {
                return Ok(DelayOutcome::Measured(ms));
            }
        }

        let message = parsed
            .and_then(|d| d.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("no delay").to_owned());
        debug!(proxy = name, status = status.as_u16(), %message, "delay probe failed");
        Ok(DelayOutcome::Failed {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET /providers/proxies`. Wire keys are dropped.
    pub async fn get_proxy_providers(&self) -> Result<Vec<ProxyProvider>, Error> {
        let resp: ProvidersResponse<ProxyProvider> =
            self.get_json(self.url(&["providers", "proxies"])?).await?;
        Ok(resp.providers.into_values().collect())
    }

    /// `PUT /providers/proxies/{name}` to refresh a provider. Returns `true` iff 204.
    pub async fn update_proxy_provider(&self, name: &str) -> Result<bool, Error> {
        self.send_mutation::<()>(
            reqwest::Method::PUT,
            self.url(&["providers", "proxies", name])?,
            None,
        )
        .await
    }

    // ── Streams ──────────────────────────────────────────────────────

    /// Open the traffic stream (`/traffic`). One sample per record, latest wins.
    ///
    /// The stream never ends on its own; call
    /// [`JsonLineStream::close`] when done.
    pub async fn traffic(&self) -> Result<JsonLineStream<Traffic>, Error> {
        let url = self.stream_url(&["traffic"], &[])?;
        JsonLineStream::connect(url, self.secret.as_deref()).await
    }

    /// Open the log stream (`/logs?level=`).
    pub async fn logs(&self, level: LogLevel) -> Result<JsonLineStream<LogEntry>, Error> {
        let level = level.to_string();
        let url = self.stream_url(&["logs"], &[("level", level.as_str())])?;
        JsonLineStream::connect(url, self.secret.as_deref()).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// WebSocket URL for a streaming endpoint, carrying the secret as `token`.
    pub(crate) fn stream_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.url(segments)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if let Some(secret) = &self.secret {
                pairs.append_pair("token", secret);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiMessage>(&body)
                .ok()
                .and_then(|m| m.message)
                .unwrap_or_else(|| body.clone());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Send a mutation; success means exactly `204 No Content`.
    async fn send_mutation<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<bool, Error> {
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();

        if status != reqwest::StatusCode::NO_CONTENT {
            debug!(status = status.as_u16(), "mutation not acknowledged");
        }
        Ok(status == reqwest::StatusCode::NO_CONTENT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str, secret: Option<&str>) -> ClashClient {
        ClashClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            secret.map(str::to_owned),
        )
        .unwrap()
    }

    #[test]
    fn url_encodes_segments() {
        let c = client("http://127.0.0.1:9090", None);
        let url = c.url(&["proxies", "HK 01/fast", "delay"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9090/proxies/HK%2001%2Ffast/delay");
    }

    #[test]
    fn url_respects_base_path() {
        let c = client("http://router.lan/clash/", None);
        let url = c.url(&["rules"]).unwrap();
        assert_eq!(url.as_str(), "http://router.lan/clash/rules");
    }

    #[test]
    fn stream_url_switches_scheme_and_adds_token() {
        let c = client("https://clash.example.com", Some("s3cret"));
        let url = c.stream_url(&["traffic"], &[]).unwrap();
        assert_eq!(url.as_str(), "wss://clash.example.com/traffic?token=s3cret");

        let c = client("http://127.0.0.1:9090", None);
        let url = c.stream_url(&["logs"], &[("level", "info")]).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9090/logs?level=info");
    }

    #[test]
    fn stream_url_without_query_has_no_question_mark() {
        let c = client("http://127.0.0.1:9090", Some(""));
        let url = c.stream_url(&["traffic"], &[]).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9090/traffic");
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = ClashClient::new(
            Url::parse("mailto:admin@example.com").unwrap(),
            &TransportConfig::default(),
        );
        assert!(matches!(result, Err(Error::InvalidBaseUrl(_))));
    }

    #[test]
    fn failed_outcome_collapses_to_zero() {
        let outcome = DelayOutcome::Failed {
            status: 504,
            message: "Timeout".into(),
        };
        assert_eq!(outcome.as_millis(), 0);
        assert_eq!(DelayOutcome::Measured(87).as_millis(), 87);
    }
}
