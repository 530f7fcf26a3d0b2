// ── Controller abstraction ──
//
// Owns the API client, the snapshot store and the latency map for one
// daemon, plus the cancellable background refresh. Consumers construct one
// and pass it around; there is no global instance.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clashctl_api::{ClashClient, DelayOutcome, JsonLineStream, LogEntry, LogLevel, Mode, Traffic};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::latency::LatencyMap;
use crate::prober::probe_members;
use crate::resolver::resolve_groups;
use crate::store::{Snapshot, SnapshotStore};

// ── Controller ───────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Refreshes replace the
/// snapshot wholesale; latency results live in a separate map that
/// survives refreshes.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ClientConfig,
    client: ClashClient,
    store: SnapshotStore,
    latency: LatencyMap,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller from configuration. Does not contact the daemon:
    /// call [`refresh()`](Self::refresh) or [`start()`](Self::start).
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a controller around an existing client.
    pub fn with_client(config: ClientConfig, client: ClashClient) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store: SnapshotStore::new(),
                latency: LatencyMap::new(),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ClashClient {
        &self.inner.client
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn latency(&self) -> &LatencyMap {
        &self.inner.latency
    }

    /// The most recent snapshot, if any refresh has completed.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.current()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the periodic refresh task. A no-op when the interval is 0.
    pub async fn start(&self) {
        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs == 0 {
            debug!("periodic refresh disabled");
            return;
        }

        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(refresh_task(ctrl, interval_secs, cancel)));
        info!(interval_secs, "periodic refresh started");
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("controller shut down");
    }

    /// Token cancelled by [`shutdown()`](Self::shutdown).
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// One-shot: build a controller, run the closure, shut down.
    ///
    /// Periodic refresh is disabled; the closure refreshes if it needs data.
    pub async fn oneshot<F, Fut, T>(config: ClientConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let controller = Controller::new(cfg)?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch config, rules, proxies and providers, resolve groups and
    /// publish the result as the new snapshot.
    ///
    /// Concurrent refreshes are not coordinated: the last one to finish wins.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let client = &self.inner.client;

        let (config, rules, proxies, rule_providers, proxy_providers) = tokio::try_join!(
            client.get_config(),
            client.get_rules(),
            client.get_proxies(),
            client.get_rule_providers(),
            client.get_proxy_providers(),
        )?;

        let proxies: Vec<Arc<_>> = proxies.into_iter().map(Arc::new).collect();
        let groups = resolve_groups(&rules, &proxies);

        debug!(
            rules = rules.len(),
            proxies = proxies.len(),
            groups = groups.len(),
            "data refresh complete"
        );

        let snapshot = Arc::new(Snapshot {
            config,
            rules,
            proxies,
            groups,
            rule_providers,
            proxy_providers,
            refreshed_at: Utc::now(),
        });
        self.inner.store.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Current snapshot, refreshing first if none exists yet.
    pub async fn ensure_snapshot(&self) -> Result<Arc<Snapshot>, CoreError> {
        match self.snapshot() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh().await,
        }
    }

    /// Refresh after a successful mutation; failure only logs.
    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, operation, "refresh after change failed");
        }
    }

    // ── Latency ──────────────────────────────────────────────────

    /// Probe `names` one by one, then refresh so history reflects the scan.
    pub async fn test_latency<S: AsRef<str> + Sync>(&self, names: &[S]) -> Result<usize, CoreError> {
        let config = &self.inner.config;
        let probed = probe_members(
            &self.inner.client,
            &self.inner.latency,
            names,
            &config.probe_url,
            config.probe_timeout_ms,
        )
        .await?;
        self.refresh_after("latency test").await;
        Ok(probed)
    }

    /// Member names `test_group_latency` would probe for `name`.
    ///
    /// Looks at resolved groups first, then proxy providers, then any group
    /// in the inventory.
    pub async fn group_members(&self, name: &str) -> Result<Vec<String>, CoreError> {
        let snapshot = self.ensure_snapshot().await?;
        if let Some(group) = snapshot.group(name) {
            return Ok(group.proxy.all.clone());
        }
        if let Some(provider) = snapshot.proxy_provider(name) {
            return Ok(provider.member_names());
        }
        match snapshot.proxy(name) {
            Some(proxy) if proxy.is_group() => Ok(proxy.all.clone()),
            _ => Err(CoreError::not_found("Group", name)),
        }
    }

    /// Probe every member of a group or proxy provider.
    pub async fn test_group_latency(&self, name: &str) -> Result<Vec<String>, CoreError> {
        let members = self.group_members(name).await?;
        self.test_latency(members.as_slice()).await?;
        Ok(members)
    }

    /// Single probe using the configured probe URL; the result is published.
    pub async fn delay(&self, name: &str) -> Result<DelayOutcome, CoreError> {
        let config = &self.inner.config;
        let outcome = self
            .inner
            .client
            .delay_outcome(name, &config.probe_url, config.probe_timeout_ms)
            .await?;
        self.inner.latency.publish(name, outcome.as_millis());
        Ok(outcome)
    }

    // ── Mutations ────────────────────────────────────────────────

    pub async fn set_mode(&self, mode: Mode) -> Result<(), CoreError> {
        if !self.inner.client.set_mode(mode).await? {
            return Err(CoreError::rejected(format!("set mode to {mode}")));
        }
        info!(%mode, "mode changed");
        self.refresh_after("set mode").await;
        Ok(())
    }

    pub async fn switch_selection(&self, selector: &str, name: &str) -> Result<(), CoreError> {
        if !self.inner.client.switch_selection(selector, name).await? {
            return Err(CoreError::rejected(format!("select {name} in {selector}")));
        }
        info!(selector, name, "selection switched");
        self.refresh_after("switch selection").await;
        Ok(())
    }

    pub async fn update_proxy_provider(&self, name: &str) -> Result<(), CoreError> {
        if !self.inner.client.update_proxy_provider(name).await? {
            return Err(CoreError::rejected(format!("update provider {name}")));
        }
        info!(provider = name, "provider updated");
        self.refresh_after("update provider").await;
        Ok(())
    }

    // ── Streams ──────────────────────────────────────────────────

    /// Open the traffic stream. The caller closes it.
    pub async fn traffic(&self) -> Result<JsonLineStream<Traffic>, CoreError> {
        Ok(self.inner.client.traffic().await?)
    }

    /// Open the log stream at `level`. The caller closes it.
    pub async fn logs(&self, level: LogLevel) -> Result<JsonLineStream<LogEntry>, CoreError> {
        Ok(self.inner.client.logs(level).await?)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Refresh on a fixed interval until cancelled. A failed cycle is logged
/// and the next one still runs.
async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = refresh_interval(interval_secs);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// A slow refresh pushes the next one back instead of bunching up ticks.
fn refresh_interval(interval_secs: u64) -> Interval {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn overdue_refresh_does_not_burst() {
        let mut interval = refresh_interval(10);
        interval.tick().await;

        // Three periods pass while a refresh is still running.
        tokio::time::advance(Duration::from_secs(35)).await;
        interval.tick().await;

        let after_overdue = Instant::now();
        interval.tick().await;
        assert!(after_overdue.elapsed() >= Duration::from_secs(10));
    }
}
