//! `groups list|show`: the proxy groups rules actually route to.

use std::fmt::Write;
use std::sync::Arc;

use clashctl_core::{Controller, DelayReading, LatencyMap, Proxy, ProxyGroup, Snapshot};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Selected")]
    now: String,
    #[tabled(rename = "Members")]
    members: usize,
}

impl From<&ProxyGroup> for GroupRow {
    fn from(g: &ProxyGroup) -> Self {
        Self {
            name: g.name().to_owned(),
            kind: g.proxy.kind.to_string(),
            now: g.proxy.now.clone().unwrap_or_default(),
            members: g.members.len(),
        }
    }
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Delay")]
    delay: String,
}

// ── Detail view ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub(super) struct MemberView {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Milliseconds; absent when unknown or failed.
    pub delay: Option<u32>,
    pub tier: String,
    pub selected: bool,
}

impl MemberView {
    pub(super) fn new(proxy: &Proxy, reading: DelayReading, now: Option<&str>) -> Self {
        Self {
            name: proxy.name.clone(),
            kind: proxy.kind.to_string(),
            delay: reading.millis(),
            tier: reading.tier().to_string(),
            selected: now == Some(proxy.name.as_str()),
        }
    }
}

#[derive(Serialize)]
struct GroupDetail {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    now: Option<String>,
    members: Vec<MemberView>,
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = controller.ensure_snapshot().await?;

    match args.command.unwrap_or(GroupsCommand::List) {
        GroupsCommand::List => {
            let out = output::render_list(
                global.output,
                &snapshot.groups,
                |g| GroupRow::from(g),
                |g| g.name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Show { name } => {
            let group = lookup(&snapshot, &name).ok_or_else(|| util::group_not_found(&name))?;
            let color = util::color(global);
            let detail = describe(&group, controller.latency());

            let out = output::render_single(
                global.output,
                &detail,
                |d| render_detail(d, &group, controller.latency(), color),
                |d| {
                    d.members
                        .iter()
                        .map(|m| m.name.as_str())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// A resolved group, a proxy provider, or any group in the inventory.
pub(super) fn lookup(snapshot: &Snapshot, name: &str) -> Option<ProxyGroup> {
    if let Some(group) = snapshot.group(name) {
        return Some(group.clone());
    }
    if let Some(provider) = snapshot.proxy_provider(name) {
        return Some(ProxyGroup::from_provider(provider));
    }
    let proxy = snapshot.proxy(name).filter(|p| p.is_group())?;
    let members: Vec<Arc<Proxy>> = proxy
        .all
        .iter()
        .filter_map(|m| snapshot.proxy(m).cloned())
        .collect();
    Some(ProxyGroup {
        proxy: Arc::clone(proxy),
        members,
    })
}

fn describe(group: &ProxyGroup, latency: &LatencyMap) -> GroupDetail {
    let now = group.proxy.now.as_deref();
    GroupDetail {
        name: group.name().to_owned(),
        kind: group.proxy.kind.to_string(),
        now: group.proxy.now.clone(),
        members: group
            .members
            .iter()
            .map(|m| MemberView::new(m, latency.reading(m), now))
            .collect(),
    }
}

fn render_detail(
    detail: &GroupDetail,
    group: &ProxyGroup,
    latency: &LatencyMap,
    color: bool,
) -> String {
    let now = detail.now.as_deref();
    let rows: Vec<MemberRow> = group
        .members
        .iter()
        .map(|m| {
            let selected = now == Some(m.name.as_str());
            MemberRow {
                marker: if selected { "*" } else { "" },
                name: if selected {
                    output::paint_selected(&m.name, color)
                } else {
                    m.name.clone()
                },
                kind: m.kind.to_string(),
                delay: output::paint_delay(latency.reading(m), color),
            }
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", detail.name, detail.kind);
    if let Some(now) = now {
        let _ = writeln!(out, "Selected: {now}");
    }
    out.push_str(&output::render_table(&rows));
    out
}
