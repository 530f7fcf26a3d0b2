//! `traffic`: upload/download rates, one line per sample.

use clashctl_core::{Controller, Traffic, format_traffic};

use crate::cli::{GlobalOpts, OutputFormat, TrafficArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: TrafficArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let stream = controller.traffic().await?;
    tracing::info!("streaming traffic");

    util::drain(stream, args.count, |sample| {
        let line = render_sample(global.output, &sample)?;
        output::print_output(&line, global.quiet);
        Ok(())
    })
    .await
}

/// Streams print one record per line, so JSON is always compact.
fn render_sample(format: OutputFormat, sample: &Traffic) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(format_traffic(sample)),
        OutputFormat::Plain => Ok(format!("{}\t{}", sample.up, sample.down)),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json(sample, true)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn samples_render_per_format() {
        let sample = Traffic { up: 2048, down: 512 };
        assert_eq!(
            render_sample(OutputFormat::Table, &sample).unwrap(),
            "2.0kbps / 512bps"
        );
        assert_eq!(render_sample(OutputFormat::Plain, &sample).unwrap(), "2048\t512");
        assert_eq!(
            render_sample(OutputFormat::Json, &sample).unwrap(),
            r#"{"up":2048,"down":512}"#
        );
    }
}
