// ── Latency state ──
//
// Name-keyed map of the most recent probe result per proxy. Lives outside
// the inventory snapshot so entries survive refreshes; every publish bumps
// a version counter and is broadcast to live observers.

use std::collections::BTreeMap;
use std::fmt;

use clashctl_api::Proxy;
use dashmap::DashMap;
use strum::Display;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;

const UPDATE_CHANNEL_SIZE: usize = 256;

/// One published probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyUpdate {
    pub name: String,
    /// Milliseconds; `0` means the probe failed.
    pub delay: u32,
}

/// Concurrent proxy name -> last measured delay (ms).
pub struct LatencyMap {
    entries: DashMap<String, u32>,
    version: watch::Sender<u64>,
    updates: broadcast::Sender<LatencyUpdate>,
}

impl LatencyMap {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            entries: DashMap::new(),
            version,
            updates,
        }
    }

    /// Record `delay` for `name`, replacing any earlier value.
    pub fn publish(&self, name: &str, delay: u32) {
        self.entries.insert(name.to_owned(), delay);
        self.version.send_modify(|v| *v += 1);
        let _ = self.updates.send(LatencyUpdate {
            name: name.to_owned(),
            delay,
        });
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|r| *r.value())
    }

    /// Sorted copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.version.send_modify(|v| *v += 1);
    }

    /// Current version; bumped on every publish or clear.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Watch the version counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Stream of results published from now on.
    pub fn updates(&self) -> BroadcastStream<LatencyUpdate> {
        BroadcastStream::new(self.updates.subscribe())
    }

    /// Display reading for `proxy`: a probe result beats its history.
    pub fn reading(&self, proxy: &Proxy) -> DelayReading {
        DelayReading::resolve(self.get(&proxy.name), proxy.last_delay())
    }
}

impl Default for LatencyMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw delay shown for `proxy`, before classification.
pub fn display_delay(latency: &LatencyMap, proxy: &Proxy) -> Option<u32> {
    latency.get(&proxy.name).or_else(|| proxy.last_delay())
}

// ── Readings ─────────────────────────────────────────────────────────

/// What is known about a proxy's latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayReading {
    Measured(u32),
    /// The daemon answered but had no measurable delay.
    Failed,
    /// Never probed and no history.
    Unknown,
}

impl DelayReading {
    /// `latency` is the latency-map entry, `history` the last history delay.
    pub fn resolve(latency: Option<u32>, history: Option<u32>) -> Self {
        match latency.or(history) {
            None => Self::Unknown,
            Some(0) => Self::Failed,
            Some(ms) => Self::Measured(ms),
        }
    }

    pub fn millis(self) -> Option<u32> {
        match self {
            Self::Measured(ms) => Some(ms),
            Self::Failed | Self::Unknown => None,
        }
    }

    pub fn tier(self) -> DelayTier {
        DelayTier::classify(self.millis())
    }
}

impl fmt::Display for DelayReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured(ms) => write!(f, "{ms}ms"),
            Self::Failed => f.write_str("timeout"),
            Self::Unknown => f.write_str("-"),
        }
    }
}

// ── Tiers ────────────────────────────────────────────────────────────

/// Fixed four-bucket latency thermometer plus a neutral bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DelayTier {
    Unknown,
    Fast,
    Moderate,
    Slow,
    Poor,
}

impl DelayTier {
    /// `None` and `0` are neutral; otherwise bucket by 1000 ms steps.
    pub fn classify(delay: Option<u32>) -> Self {
        match delay {
            None | Some(0) => Self::Unknown,
            Some(ms) if ms < 1000 => Self::Fast,
            Some(ms) if ms < 2000 => Self::Moderate,
            Some(ms) if ms < 3000 => Self::Slow,
            Some(_) => Self::Poor,
        }
    }

    /// CSS colour of the tier.
    pub fn css(self) -> &'static str {
        match self {
            Self::Unknown => "grey",
            Self::Fast => "#2ecc71",
            Self::Moderate => "#f1c40f",
            Self::Slow => "#e67e22",
            Self::Poor => "red",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Unknown => (0x80, 0x80, 0x80),
            Self::Fast => (0x2e, 0xcc, 0x71),
            Self::Moderate => (0xf1, 0xc4, 0x0f),
            Self::Slow => (0xe6, 0x7e, 0x22),
            Self::Poor => (0xff, 0x00, 0x00),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clashctl_api::{DelayRecord, ProxyType};
    use tokio_test::{assert_pending, assert_ready_ok, task};

    use super::*;

    fn leaf(name: &str, history: &[u32]) -> Proxy {
        Proxy {
            name: name.into(),
            kind: ProxyType::Vmess,
            all: Vec::new(),
            now: None,
            history: history
                .iter()
                .map(|&delay| DelayRecord {
                    time: String::new(),
                    delay,
                })
                .collect(),
            udp: false,
        }
    }

    #[test]
    fn probe_result_overrides_history() {
        let map = LatencyMap::new();
        let hk = leaf("HK", &[300, 120]);

        assert_eq!(display_delay(&map, &hk), Some(120));
        assert_eq!(map.reading(&hk), DelayReading::Measured(120));

        map.publish("HK", 80);
        assert_eq!(display_delay(&map, &hk), Some(80));
        assert_eq!(map.reading(&hk), DelayReading::Measured(80));
    }

    #[test]
    fn zero_means_failed_and_nothing_means_unknown() {
        let map = LatencyMap::new();
        assert_eq!(map.reading(&leaf("A", &[])), DelayReading::Unknown);
        assert_eq!(map.reading(&leaf("B", &[0])), DelayReading::Failed);

        map.publish("A", 0);
        assert_eq!(map.reading(&leaf("A", &[250])), DelayReading::Failed);
        assert_eq!(DelayReading::Failed.tier(), DelayTier::Unknown);
        assert_eq!(DelayReading::Unknown.to_string(), "-");
        assert_eq!(DelayReading::Measured(42).to_string(), "42ms");
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(DelayTier::classify(Some(999)), DelayTier::Fast);
        assert_eq!(DelayTier::classify(Some(1000)), DelayTier::Moderate);
        assert_eq!(DelayTier::classify(Some(1999)), DelayTier::Moderate);
        assert_eq!(DelayTier::classify(Some(2000)), DelayTier::Slow);
        assert_eq!(DelayTier::classify(Some(2999)), DelayTier::Slow);
        assert_eq!(DelayTier::classify(Some(3000)), DelayTier::Poor);
        assert_eq!(DelayTier::classify(None), DelayTier::Unknown);
        assert_eq!(DelayTier::classify(Some(0)), DelayTier::Unknown);
    }

    #[test]
    fn tier_colours() {
        assert_eq!(DelayTier::Fast.css(), "#2ecc71");
        assert_eq!(DelayTier::Poor.css(), "red");
        assert_eq!(DelayTier::Unknown.css(), "grey");
        assert_eq!(DelayTier::Slow.rgb(), (0xe6, 0x7e, 0x22));
        assert_eq!(DelayTier::Moderate.to_string(), "moderate");
    }

    #[test]
    fn publish_overwrites_and_notifies() {
        let map = LatencyMap::new();
        let mut rx = map.subscribe();

        {
            let mut changed = task::spawn(rx.changed());
            assert_pending!(changed.poll());

            map.publish("HK", 120);
            assert!(changed.is_woken());
            assert_ready_ok!(changed.poll());
        }

        map.publish("HK", 90);
        map.publish("JP", 200);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("HK"), Some(90));
        assert_eq!(map.version(), 3);
        assert_eq!(
            map.snapshot().into_iter().collect::<Vec<_>>(),
            vec![("HK".to_owned(), 90), ("JP".to_owned(), 200)]
        );

        map.clear();
        assert!(map.is_empty());
        assert_eq!(*rx.borrow_and_update(), 4);
    }

    #[tokio::test]
    async fn updates_stream_sees_each_publish() {
        use futures_util::StreamExt;

        let map = LatencyMap::new();
        let mut updates = map.updates();

        map.publish("HK", 120);
        map.publish("JP", 0);

        let first = updates.next().await.unwrap().unwrap();
        let second = updates.next().await.unwrap().unwrap();
        assert_eq!(
            first,
            LatencyUpdate {
                name: "HK".into(),
                delay: 120
            }
        );
        assert_eq!(second.name, "JP");
        assert_eq!(second.delay, 0);
    }
}
