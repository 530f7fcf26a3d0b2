// Wire types for the controller API.
//
// Field names follow the daemon's JSON exactly (camelCase for providers,
// kebab-case for runtime config). Open enums keep unknown names verbatim so
// newer daemon builds never break decoding.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── Proxy type ───────────────────────────────────────────────────────

/// Kind of a proxy entry in the inventory.
///
/// Group kinds (`Selector`, `URLTest`, ...) carry an `all` member list;
/// everything else is a leaf outbound. Unrecognized names land in `Other`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(from = "String", into = "String")]
pub enum ProxyType {
    Selector,
    URLTest,
    Fallback,
    LoadBalance,
    Relay,
    Direct,
    Reject,
    Pass,
    Compatible,
    Shadowsocks,
    ShadowsocksR,
    Snell,
    Socks5,
    Http,
    Vmess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    WireGuard,
    Tuic,
    #[strum(default)]
    Other(String),
}

impl ProxyType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(name) => name,
            known => known.as_ref(),
        }
    }

    /// Whether entries of this kind own a member list.
    pub fn is_group(&self) -> bool {
        matches!(
            self,
            Self::Selector | Self::URLTest | Self::Fallback | Self::LoadBalance | Self::Relay
        )
    }
}

impl From<String> for ProxyType {
    fn from(name: String) -> Self {
        Self::from_str(&name).unwrap_or(Self::Other(name))
    }
}

impl From<ProxyType> for String {
    fn from(kind: ProxyType) -> Self {
        match kind {
            ProxyType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}


// ── Proxy ────────────────────────────────────────────────────────────

/// One past latency measurement recorded by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRecord {
    #[serde(default)]
    pub time: String,
    /// Milliseconds; `0` means the probe failed.
    #[serde(default)]
    pub delay: u32,
}

/// A proxy or proxy group from the daemon inventory.
///
/// The `/proxies` endpoint keys records by name and omits `name` inside the
/// value; [`ClashClient::get_proxies`](crate::ClashClient::get_proxies)
/// injects it before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ProxyType,

    /// Member names, in daemon order. Empty for leaf proxies.
    #[serde(default)]
    pub all: Vec<String>,

    /// Currently active member (groups only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,

    #[serde(default)]
    pub history: Vec<DelayRecord>,

    #[serde(default)]
    pub udp: bool,
}

impl Proxy {
    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    /// Delay of the most recent history entry.
    pub fn last_delay(&self) -> Option<u32> {
        self.history.last().map(|h| h.delay)
    }
}

// ── Rules ────────────────────────────────────────────────────────────

/// Matcher kind of a routing rule.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    Domain,
    DomainSuffix,
    DomainKeyword,
    GeoSite,
    GeoIP,
    IPCIDR,
    IPCIDR6,
    SrcIPCIDR,
    SrcPort,
    DstPort,
    ProcessName,
    ProcessPath,
    RuleSet,
    Match,
    #[strum(default)]
    Other(String),
}

impl RuleType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Other(name) => name,
            known => known.as_ref(),
        }
    }
}

impl From<String> for RuleType {
    fn from(name: String) -> Self {
        Self::from_str(&name).unwrap_or(Self::Other(name))
    }
}

impl From<RuleType> for String {
    fn from(kind: RuleType) -> Self {
        match kind {
            RuleType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}


/// A routing rule as currently resolved by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub kind: RuleType,

    #[serde(default)]
    pub payload: String,

    /// Target proxy/group name, or one of the `DIRECT` / `REJECT` sentinels.
    pub proxy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl Rule {
    /// The referenced rule provider, for `RuleSet` rules.
    pub fn provider(&self) -> Option<&str> {
        (self.kind == RuleType::RuleSet).then_some(self.payload.as_str())
    }
}

// ── Providers ────────────────────────────────────────────────────────

/// Metadata for an externally sourced rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleProvider {
    pub name: String,

    #[serde(default)]
    pub behavior: String,

    #[serde(rename = "vehicleType", default)]
    pub vehicle_type: String,

    #[serde(rename = "ruleCount", default)]
    pub rule_count: u64,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// An externally sourced proxy collection with its own member records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyProvider {
    pub name: String,

    #[serde(rename = "vehicleType", default)]
    pub vehicle_type: String,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub proxies: Vec<Proxy>,
}

impl ProxyProvider {
    /// Names of the provider's proxies, in provider order.
    pub fn member_names(&self) -> Vec<String> {
        self.proxies.iter().map(|p| p.name.clone()).collect()
    }
}

// ── Runtime configuration ────────────────────────────────────────────

/// Routing mode of the daemon.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    #[serde(alias = "Direct")]
    Direct,
    #[default]
    #[serde(alias = "Rule")]
    Rule,
    #[serde(alias = "Global")]
    Global,
}

/// Log verbosity accepted by the `/logs` stream.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Silent,
}

/// Runtime configuration reported by `GET /configs`.
///
/// Only the fields this crate acts on are typed; everything else the daemon
/// reports is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub port: u16,

    #[serde(rename = "socks-port", default)]
    pub socks_port: u16,

    #[serde(rename = "mixed-port", default)]
    pub mixed_port: u16,

    #[serde(rename = "allow-lan", default)]
    pub allow_lan: bool,

    #[serde(rename = "log-level", default)]
    pub log_level: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Partial update for `PATCH /configs`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    #[serde(rename = "allow-lan", skip_serializing_if = "Option::is_none")]
    pub allow_lan: Option<bool>,
}

impl ConfigPatch {
    pub fn mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }
}

// ── Stream records ───────────────────────────────────────────────────

/// Current byte rate pair pushed by the traffic stream, once per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub up: u64,
    pub down: u64,
}

/// A line from the daemon's log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub level: String,
    pub payload: String,
}

// ── Envelopes ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RulesResponse {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProxiesResponse {
    #[serde(default)]
    pub proxies: IndexMap<String, Proxy>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
pub(crate) struct ProvidersResponse<T> {
    #[serde(default = "IndexMap::new")]
    pub providers: IndexMap<String, T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelayResponse {
    #[serde(default)]
    pub delay: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}
