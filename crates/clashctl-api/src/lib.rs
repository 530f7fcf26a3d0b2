// clashctl-api: Async Rust client for the Clash / mihomo external controller API

pub mod client;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::{ClashClient, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_PROBE_URL, DelayOutcome};
pub use error::Error;
pub use models::{
    ConfigPatch, DelayRecord, LogEntry, LogLevel, Mode, Proxy, ProxyProvider, ProxyType, Rule,
    RuleProvider, RuleType, RuntimeConfig, Traffic,
};
pub use stream::JsonLineStream;
pub use transport::TransportConfig;
