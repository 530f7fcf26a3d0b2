//! Shared helpers for command handlers.

use clashctl_core::{JsonLineStream, LogLevel, Mode};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::cli::{GlobalOpts, LevelArg, ModeArg};
use crate::error::CliError;
use crate::output;

pub fn mode(arg: ModeArg) -> Mode {
    match arg {
        ModeArg::Direct => Mode::Direct,
        ModeArg::Rule => Mode::Rule,
        ModeArg::Global => Mode::Global,
    }
}

pub fn log_level(arg: LevelArg) -> LogLevel {
    match arg {
        LevelArg::Debug => LogLevel::Debug,
        LevelArg::Info => LogLevel::Info,
        LevelArg::Warning => LogLevel::Warning,
        LevelArg::Error => LogLevel::Error,
    }
}

/// Whether tables and stream lines should carry ANSI colour.
pub fn color(global: &GlobalOpts) -> bool {
    output::should_color(global.color)
}

/// Status line on stderr, unless `--quiet`.
pub fn notice(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

pub fn group_not_found(name: &str) -> CliError {
    CliError::NotFound {
        kind: "Group".into(),
        name: name.into(),
        list_command: "groups list".into(),
    }
}

/// Feed stream records to `on_item` until `limit` records, Ctrl-C, or the
/// daemon closing the stream; then close the connection.
pub async fn drain<T, F>(
    mut stream: JsonLineStream<T>,
    limit: Option<usize>,
    mut on_item: F,
) -> Result<(), CliError>
where
    T: DeserializeOwned + Unpin,
    F: FnMut(T) -> Result<(), CliError>,
{
    let mut seen = 0usize;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    while limit.is_none_or(|n| seen < n) {
        tokio::select! {
            _ = &mut interrupted => {
                tracing::debug!("interrupted");
                break;
            }
            item = stream.next() => match item {
                Some(Ok(record)) => {
                    on_item(record)?;
                    seen += 1;
                }
                Some(Err(e)) => tracing::warn!(error = %e, "skipping stream record"),
                None => break,
            },
        }
    }

    // The daemon may already have closed its side.
    if let Err(e) = stream.close().await {
        tracing::debug!(error = %e, "stream close failed");
    }
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_enums_map_to_wire_values() {
        assert_eq!(mode(ModeArg::Global).to_string(), "global");
        assert_eq!(log_level(LevelArg::Warning).to_string(), "warning");
    }
}
