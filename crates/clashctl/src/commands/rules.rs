//! `rules`: routing rules in daemon order.

use clashctl_core::{Controller, Rule};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Payload")]
    payload: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Provider")]
    provider: String,
}

impl From<(usize, &Rule)> for RuleRow {
    fn from((i, r): (usize, &Rule)) -> Self {
        Self {
            index: i + 1,
            kind: r.kind.to_string(),
            payload: r.payload.clone(),
            target: r.proxy.clone(),
            provider: r.provider().unwrap_or_default().to_owned(),
        }
    }
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = controller.ensure_snapshot().await?;
    let rules = &snapshot.rules;

    // Rule order is the routing order, so the table numbers its rows.
    let out = if global.output == OutputFormat::Table {
        let rows: Vec<RuleRow> = rules.iter().enumerate().map(RuleRow::from).collect();
        output::render_table(&rows)
    } else {
        output::render_list(
            global.output,
            rules,
            |r| RuleRow::from((0, r)),
            |r| format!("{},{},{}", r.kind, r.payload, r.proxy),
        )?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
