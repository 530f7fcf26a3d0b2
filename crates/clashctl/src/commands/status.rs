//! `status`: routing mode, listener ports and one traffic sample.

use std::fmt::Write;
use std::time::Duration;

use clashctl_core::{Controller, CoreError, Mode, Traffic, format_traffic};
use futures_util::StreamExt;
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// The daemon pushes a sample every second; give up after a few.
const SAMPLE_WAIT: Duration = Duration::from_secs(3);

#[derive(Serialize)]
struct StatusView {
    api: String,
    mode: Mode,
    port: u16,
    socks_port: u16,
    mixed_port: u16,
    allow_lan: bool,
    log_level: String,
    traffic: Option<Traffic>,
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let config = controller
        .client()
        .get_config()
        .await
        .map_err(CoreError::from)?;

    let traffic = sample_traffic(controller).await;

    let view = StatusView {
        api: controller.config().url.to_string(),
        mode: config.mode,
        port: config.port,
        socks_port: config.socks_port,
        mixed_port: config.mixed_port,
        allow_lan: config.allow_lan,
        log_level: config.log_level,
        traffic,
    };

    let out = output::render_single(global.output, &view, detail, |v| v.mode.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// First traffic sample, or `None` if the stream is unavailable or silent.
async fn sample_traffic(controller: &Controller) -> Option<Traffic> {
    let mut stream = match controller.traffic().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(error = %e, "traffic stream unavailable");
            return None;
        }
    };

    let sample = match tokio::time::timeout(SAMPLE_WAIT, stream.next()).await {
        Ok(Some(Ok(sample))) => Some(sample),
        Ok(Some(Err(e))) => {
            tracing::debug!(error = %e, "bad traffic sample");
            None
        }
        Ok(None) | Err(_) => None,
    };

    if let Err(e) = stream.close().await {
        tracing::debug!(error = %e, "traffic stream close failed");
    }
    sample
}

fn detail(v: &StatusView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Controller:  {}", v.api);
    let _ = writeln!(out, "Mode:        {}", v.mode);
    let _ = writeln!(out, "Port:        {}", v.port);
    let _ = writeln!(out, "SOCKS port:  {}", v.socks_port);
    if v.mixed_port != 0 {
        let _ = writeln!(out, "Mixed port:  {}", v.mixed_port);
    }
    let _ = writeln!(out, "Allow LAN:   {}", v.allow_lan);
    let _ = writeln!(out, "Log level:   {}", v.log_level);
    let traffic = v
        .traffic
        .as_ref()
        .map_or_else(|| "-".to_owned(), format_traffic);
    let _ = write!(out, "Traffic:     {traffic}");
    out
}
