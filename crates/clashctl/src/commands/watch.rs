//! `watch`: keep the group view fresh until Ctrl-C.

use chrono::Local;
use clashctl_core::{Controller, Snapshot};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct WatchRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Selected")]
    now: String,
    #[tabled(rename = "Delay")]
    delay: String,
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let interval = controller.config().refresh_interval_secs;
    if interval == 0 {
        return Err(CliError::Validation {
            field: "refresh_interval".into(),
            reason: "watch needs a refresh interval above 0 seconds".into(),
        });
    }

    let mut updates = controller.store().subscribe();
    let first = controller.refresh().await?;
    updates.borrow_and_update();
    print_snapshot(controller, &first, global)?;

    controller.start().await;
    util::notice(
        global,
        &format!("Refreshing every {interval}s, Ctrl-C to stop"),
    );

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_snapshot(controller, &snapshot, global)?;
                }
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

fn print_snapshot(
    controller: &Controller,
    snapshot: &Snapshot,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = util::color(global);
    let latency = controller.latency();

    let out = match global.output {
        OutputFormat::Table => {
            let rows: Vec<WatchRow> = snapshot
                .groups
                .iter()
                .map(|g| {
                    let selected = g.proxy.now.as_deref().and_then(|n| snapshot.proxy(n));
                    WatchRow {
                        group: g.name().to_owned(),
                        now: g.proxy.now.clone().unwrap_or_default(),
                        delay: selected.map_or_else(String::new, |p| {
                            output::paint_delay(latency.reading(p), color)
                        }),
                    }
                })
                .collect();
            format!(
                "{} mode={}\n{}",
                snapshot.refreshed_at.with_timezone(&Local).format("%H:%M:%S"),
                snapshot.config.mode,
                output::render_table(&rows)
            )
        }
        // One document per refresh.
        format => output::render_single(format, &snapshot.groups, |_| String::new(), |groups| {
            groups
                .iter()
                .map(|g| format!("{}\t{}", g.name(), g.proxy.now.as_deref().unwrap_or("-")))
                .collect::<Vec<_>>()
                .join("\n")
        })?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
