// ── Latency prober ──
//
// Probes a list of proxies one at a time. Each result is published before
// the next probe goes out, so observers of the `LatencyMap` watch coverage
// grow in member order.

use clashctl_api::ClashClient;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::latency::LatencyMap;

/// Sequentially probe `names` through the daemon, publishing each delay.
///
/// Daemon-reported failures are published as `0`. A transport error stops
/// the scan; results already published stay in the map. Returns the number
/// of proxies probed.
pub async fn probe_members<S: AsRef<str> + Sync>(
    client: &ClashClient,
    latency: &LatencyMap,
    names: &[S],
    url: &str,
    timeout_ms: u32,
) -> Result<usize, CoreError> {
    info!(count = names.len(), url, "probing latency");

    for name in names {
        let name = name.as_ref();
        let delay = client.delay(name, url, timeout_ms).await?;
        debug!(proxy = name, delay, "probe finished");
        latency.publish(name, delay);
    }

    Ok(names.len())
}
