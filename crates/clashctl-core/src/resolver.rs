// ── Proxy group resolution ──
//
// Turns the flat proxy inventory plus the rule list into the ordered set of
// groups worth showing: every rule target, then any URLTest group nested one
// level below them. Pure: inputs are only read, outputs are built fresh.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use clashctl_api::{Proxy, ProxyProvider, ProxyType, Rule};
use indexmap::IndexSet;
use serde::{Serialize, Serializer};

/// Routing targets that never resolve to an inventory entry.
pub const SENTINELS: [&str; 2] = ["REJECT", "DIRECT"];

/// A proxy (usually a group) with its member names resolved.
///
/// `proxy` is shared with the inventory snapshot and never mutated;
/// `members` is rebuilt on every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyGroup {
    #[serde(flatten)]
    pub proxy: Arc<Proxy>,
    #[serde(serialize_with = "member_names")]
    pub members: Vec<Arc<Proxy>>,
}

impl ProxyGroup {
    pub fn name(&self) -> &str {
        &self.proxy.name
    }

    /// Names of the resolved members, in `all` order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// Render a proxy provider as a group whose members are its own proxies.
    pub fn from_provider(provider: &ProxyProvider) -> Self {
        let members: Vec<Arc<Proxy>> = provider.proxies.iter().cloned().map(Arc::new).collect();
        let proxy = Proxy {
            name: provider.name.clone(),
            kind: ProxyType::Other("Provider".into()),
            all: provider.member_names(),
            now: None,
            history: Vec::new(),
            udp: false,
        };
        Self {
            proxy: Arc::new(proxy),
            members,
        }
    }
}

fn member_names<S: Serializer>(members: &[Arc<Proxy>], ser: S) -> Result<S::Ok, S::Error> {
    ser.collect_seq(members.iter().map(|m| m.name.as_str()))
}

/// Look up a resolved group by name.
pub fn find_group<'a>(groups: &'a [ProxyGroup], name: &str) -> Option<&'a ProxyGroup> {
    groups.iter().find(|g| g.name() == name)
}

/// Resolve the groups referenced by `rules` against `proxies`.
///
/// Order: rule targets in first-seen order, then URLTest groups found
/// among their members, in discovery order. Names are unique in the output.
/// Targets or members missing from the inventory are skipped silently.
///
/// Nested URLTest groups are expanded exactly one level: groups found by
/// the discovery pass are not scanned again.
pub fn resolve_groups(rules: &[Rule], proxies: &[Arc<Proxy>]) -> Vec<ProxyGroup> {
    let mut index: HashMap<&str, &Arc<Proxy>> = HashMap::with_capacity(proxies.len());
    for proxy in proxies {
        index.entry(proxy.name.as_str()).or_insert(proxy);
    }

    let targets: IndexSet<&str> = rules
        .iter()
        .map(|rule| rule.proxy.as_str())
        .filter(|name| !SENTINELS.contains(name))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups: Vec<ProxyGroup> = Vec::with_capacity(targets.len());
    for name in targets {
        if let Some(&proxy) = index.get(name) {
            seen.insert(proxy.name.as_str());
            groups.push(materialize(&index, proxy));
        }
    }

    let mut discovered = Vec::new();
    for group in &groups {
        for member in &group.members {
            if member.kind != ProxyType::URLTest {
                continue;
            }
            let Some(&proxy) = index.get(member.name.as_str()) else {
                continue;
            };
            if seen.insert(proxy.name.as_str()) {
                discovered.push(materialize(&index, proxy));
            }
        }
    }
    groups.extend(discovered);

    tracing::trace!(groups = groups.len(), "resolved proxy groups");
    groups
}

fn materialize(index: &HashMap<&str, &Arc<Proxy>>, proxy: &Arc<Proxy>) -> ProxyGroup {
    let members = proxy
        .all
        .iter()
        .filter_map(|name| index.get(name.as_str()).map(|&p| Arc::clone(p)))
        .collect();
    ProxyGroup {
        proxy: Arc::clone(proxy),
        members,
    }
}
