// ── Snapshot store ──
//
// Holds the most recent inventory snapshot. Refreshes replace it wholesale
// through a `watch` channel; readers get a cheap `Arc` clone and never see
// a half-applied refresh. Whichever refresh publishes last wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clashctl_api::{Proxy, ProxyProvider, Rule, RuleProvider, RuntimeConfig};
use tokio::sync::watch;

use crate::resolver::{ProxyGroup, find_group};

/// Everything fetched by one refresh, plus the resolved groups.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub config: RuntimeConfig,
    pub rules: Vec<Rule>,
    pub proxies: Vec<Arc<Proxy>>,
    pub groups: Vec<ProxyGroup>,
    pub rule_providers: Vec<RuleProvider>,
    pub proxy_providers: Vec<ProxyProvider>,
    pub refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn group(&self, name: &str) -> Option<&ProxyGroup> {
        find_group(&self.groups, name)
    }

    pub fn proxy(&self, name: &str) -> Option<&Arc<Proxy>> {
        self.proxies.iter().find(|p| p.name == name)
    }

    pub fn proxy_provider(&self, name: &str) -> Option<&ProxyProvider> {
        self.proxy_providers.iter().find(|p| p.name == name)
    }
}

/// Latest-wins holder for [`Snapshot`]s.
pub struct SnapshotStore {
    current: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.current.send_replace(Some(snapshot));
    }

    /// The most recent snapshot, or `None` before the first refresh.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.current.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.current.borrow().as_ref().map(|s| s.refreshed_at)
    }

    /// How long ago the last refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
