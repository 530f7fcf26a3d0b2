// clashctl-core: Proxy group resolution and shared state between clashctl-api and the CLI.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod latency;
pub mod prober;
pub mod resolver;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ClientConfig;
pub use controller::Controller;
pub use error::CoreError;
pub use format::{format_rate, format_traffic};
pub use latency::{DelayReading, DelayTier, LatencyMap, LatencyUpdate, display_delay};
pub use prober::probe_members;
pub use resolver::{ProxyGroup, find_group, resolve_groups};
pub use store::{Snapshot, SnapshotStore};

// Wire types consumers need alongside the core.
pub use clashctl_api::{
    DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_PROBE_URL, DelayOutcome, JsonLineStream, LogEntry, LogLevel,
    Mode, Proxy, ProxyProvider, ProxyType, Rule, RuleProvider, RuleType, RuntimeConfig, Traffic,
};
