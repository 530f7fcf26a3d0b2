// Human-readable traffic rates.

use clashctl_api::Traffic;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;

/// `512` -> `512b`, `2048` -> `2.0kb`, `2097152` -> `2.0mb`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_rate(value: u64) -> String {
    if value < KB {
        format!("{value}b")
    } else if value < MB {
        format!("{:.1}kb", value as f64 / KB as f64)
    } else {
        format!("{:.1}mb", value as f64 / MB as f64)
    }
}

/// `up / down` per second, e.g. `1.5kbps / 2.0mbps`.
pub fn format_traffic(traffic: &Traffic) -> String {
    format!(
        "{}ps / {}ps",
        format_rate(traffic.up),
        format_rate(traffic.down)
    )
}
