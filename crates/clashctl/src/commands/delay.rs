//! `delay <name>`: a single latency probe.

use clashctl_core::{Controller, CoreError, DelayOutcome, DelayReading};
use serde::Serialize;

use crate::cli::{DelayArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct DelayView {
    name: String,
    /// Milliseconds; `0` when the probe failed.
    delay: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn handle(
    controller: &Controller,
    args: DelayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let outcome = if args.url.is_some() || args.probe_timeout.is_some() {
        let config = controller.config();
        let url = args.url.as_deref().unwrap_or(&config.probe_url);
        let timeout = args.probe_timeout.unwrap_or(config.probe_timeout_ms);
        let outcome = controller
            .client()
            .delay_outcome(&args.name, url, timeout)
            .await
            .map_err(CoreError::from)?;
        controller.latency().publish(&args.name, outcome.as_millis());
        outcome
    } else {
        controller.delay(&args.name).await?
    };

    let view = DelayView {
        name: args.name,
        delay: outcome.as_millis(),
        error: match outcome {
            DelayOutcome::Measured(_) => None,
            DelayOutcome::Failed { status, message } => Some(format!("{message} (HTTP {status})")),
        },
    };

    let reading = DelayReading::resolve(Some(view.delay), None);
    let color = util::color(global);
    let out = output::render_single(
        global.output,
        &view,
        |v| match v.error {
            Some(ref e) => format!("{}: {} ({e})", v.name, output::paint_delay(reading, color)),
            None => format!("{}: {}", v.name, output::paint_delay(reading, color)),
        },
        |v| v.delay.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
