//! `proxies get`: one proxy or group as the daemon reports it.

use std::fmt::Write;

use clashctl_core::{Controller, CoreError, DelayReading, Proxy};
use serde::Serialize;

use crate::cli::{GlobalOpts, ProxiesArgs, ProxiesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ProxyDetail<'a> {
    #[serde(flatten)]
    proxy: &'a Proxy,
    /// Latest delay from this session's probes or the daemon's history.
    delay: Option<u32>,
}

pub async fn handle(
    controller: &Controller,
    args: ProxiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProxiesCommand::Get { name } => {
            let proxy = controller.client().get_proxy(&name).await.map_err(|e| {
                if e.is_not_found() {
                    CliError::NotFound {
                        kind: "Proxy".into(),
                        name: name.clone(),
                        list_command: "groups show <group>".into(),
                    }
                } else {
                    CoreError::from(e).into()
                }
            })?;

            let reading = controller.latency().reading(&proxy);
            let color = util::color(global);
            let detail = ProxyDetail {
                proxy: &proxy,
                delay: reading.millis(),
            };

            let out = output::render_single(
                global.output,
                &detail,
                |d| render_detail(d.proxy, reading, color),
                |d| d.proxy.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn render_detail(p: &Proxy, reading: DelayReading, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:      {}", p.name);
    let _ = writeln!(out, "Type:      {}", p.kind);
    let _ = writeln!(out, "UDP:       {}", p.udp);
    if let Some(ref now) = p.now {
        let _ = writeln!(out, "Selected:  {now}");
    }
    if !p.all.is_empty() {
        let _ = writeln!(out, "Members:   {}", p.all.join(", "));
    }
    let _ = write!(out, "Delay:     {}", output::paint_delay(reading, color));
    out
}
