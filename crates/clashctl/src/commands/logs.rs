//! `logs`: daemon log lines at or above a level.

use clashctl_core::{Controller, LogEntry};
use owo_colors::OwoColorize;

use crate::cli::{GlobalOpts, LogsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let level = util::log_level(args.level);
    let stream = controller.logs(level).await?;
    tracing::info!(%level, "streaming logs");

    let color = util::color(global);
    util::drain(stream, args.count, |entry| {
        let line = render_entry(global.output, &entry, color)?;
        output::print_output(&line, global.quiet);
        Ok(())
    })
    .await
}

fn render_entry(format: OutputFormat, entry: &LogEntry, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(format!(
            "{:<7} {}",
            paint_level(&entry.level, color),
            entry.payload
        )),
        OutputFormat::Plain => Ok(entry.payload.clone()),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json(entry, true)
        }
    }
}

fn paint_level(level: &str, color: bool) -> String {
    if !color {
        return level.to_owned();
    }
    match level {
        "error" => level.red().to_string(),
        "warning" => level.yellow().to_string(),
        "debug" => level.dimmed().to_string(),
        _ => level.green().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(level: &str, payload: &str) -> LogEntry {
        LogEntry {
            level: level.into(),
            payload: payload.into(),
        }
    }

    #[test]
    fn entries_render_per_format() {
        let e = entry("warning", "dial tcp: i/o timeout");
        assert_eq!(
            render_entry(OutputFormat::Table, &e, false).unwrap(),
            "warning dial tcp: i/o timeout"
        );
        assert_eq!(
            render_entry(OutputFormat::Plain, &e, false).unwrap(),
            "dial tcp: i/o timeout"
        );
        assert_eq!(
            render_entry(OutputFormat::JsonCompact, &e, false).unwrap(),
            r#"{"type":"warning","payload":"dial tcp: i/o timeout"}"#
        );
    }

    #[test]
    fn level_colour_only_when_enabled() {
        assert_eq!(paint_level("error", false), "error");
        assert!(paint_level("error", true).starts_with("\u{1b}["));
    }
}
