//! `probe <group>`: sequential latency scan with a progress bar.
//!
//! The scan itself lives in the controller; this handler only watches the
//! latency map's update feed to drive the bar, then prints one row per
//! member in scan order.

use std::time::Duration;

use clashctl_core::{Controller, DelayReading, LatencyUpdate};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use crate::cli::{GlobalOpts, ProbeArgs};
use crate::error::CliError;
use crate::output;

use super::groups::MemberView;
use super::util;

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Delay")]
    delay: String,
    #[tabled(rename = "Tier")]
    tier: String,
}

pub async fn handle(
    controller: &Controller,
    args: ProbeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let members = controller.group_members(&args.group).await?;
    if members.is_empty() {
        util::notice(global, &format!("{} has no members to probe", args.group));
        return Ok(());
    }

    let bar = progress_bar(u64::try_from(members.len()).unwrap_or(u64::MAX), global.quiet);
    let mut updates = controller.latency().updates();
    let progress = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.next().await {
                // A lagged receiver only skips bar ticks.
                if let Ok(LatencyUpdate { name, delay }) = update {
                    bar.set_message(format!("{name} {}", DelayReading::resolve(Some(delay), None)));
                    bar.inc(1);
                }
            }
        })
    };

    let result = controller.test_latency(members.as_slice()).await;
    progress.abort();
    bar.finish_and_clear();
    result?;

    let snapshot = controller.snapshot();
    let latency = controller.latency();
    let views: Vec<MemberView> = members
        .iter()
        .map(|name| {
            let proxy = snapshot.as_ref().and_then(|s| s.proxy(name));
            let reading = match proxy {
                Some(p) => latency.reading(p),
                None => DelayReading::resolve(latency.get(name), None),
            };
            MemberView {
                name: name.clone(),
                kind: proxy.map(|p| p.kind.to_string()).unwrap_or_default(),
                delay: reading.millis(),
                tier: reading.tier().to_string(),
                selected: false,
            }
        })
        .collect();

    let color = util::color(global);
    let out = output::render_list(
        global.output,
        &views,
        |v| {
            let reading = DelayReading::resolve(latency.get(&v.name), v.delay);
            ProbeRow {
                name: v.name.clone(),
                delay: output::paint_delay(reading, color),
                tier: v.tier.clone(),
            }
        },
        |v| format!("{}\t{}", v.name, v.delay.unwrap_or(0)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
